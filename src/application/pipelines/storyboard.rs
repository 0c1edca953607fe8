//! Storyboard pipeline: visual script frames to generated images.
//!
//! Reference image order per frame: location, characters in tag order,
//! props, then the prior frame of the same scene for continuity.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const SCRIPT_MISSING: &str = "No visual script found. Run Director pipeline first.";

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LoadVisualScript { ctx: Arc::clone(&ctx) }),
        Box::new(PrepareReferences { ctx: Arc::clone(&ctx) }),
        Box::new(GenerateImages { ctx: Arc::clone(&ctx) }),
        Box::new(SaveOutputs { ctx }),
    ]
}

/// Frames to generate after the scene filter and frame cap are applied.
fn selected_frames(ctx: &PipelineContext, script: &Value) -> Vec<Value> {
    let mut frames: Vec<Value> = script["frames"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    if let Some(filter) = &ctx.params.scene_filter {
        frames.retain(|f| {
            f["scene_number"]
                .as_i64()
                .is_some_and(|n| filter.contains(&n))
        });
    }
    if let Some(max) = ctx.params.max_frames {
        frames.truncate(max);
    }
    frames
}

struct LoadVisualScript {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for LoadVisualScript {
    fn name(&self) -> &str {
        "Load Visual Script"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let script = self
            .ctx
            .require_json("storyboard/visual_script.json", SCRIPT_MISSING)
            .await?;
        let all = script["frames"].as_array().map_or(0, |a| a.len());
        if all == 0 {
            return Err(StageError::Precondition(SCRIPT_MISSING.to_string()));
        }
        progress.log(format!("Loaded {} frames", all));

        let selected = selected_frames(&self.ctx, &script).len();
        if let Some(filter) = &self.ctx.params.scene_filter {
            progress.log(format!(
                "Filtered to scenes {:?}: {} frames",
                filter, selected
            ));
        }
        if self.ctx.params.max_frames.is_some_and(|max| all > max) {
            progress.log(format!("Limited to {} frames", selected));
        }
        Ok(())
    }
}

struct PrepareReferences {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for PrepareReferences {
    fn name(&self) -> &str {
        "Prepare References"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let refs = self
            .ctx
            .store
            .list(&self.ctx.project_dir, "references")
            .await
            .map_err(|e| StageError::Failed(e.to_string()))?;
        progress.log(format!("{} reference images available", refs.len()));
        Ok(())
    }
}

struct GenerateImages {
    ctx: Arc<PipelineContext>,
}

impl GenerateImages {
    /// Reference paths for a frame: location first, then characters, then
    /// props, then the prior frame of the same scene.
    async fn frame_references(&self, frame: &Value, prior: Option<&str>) -> Vec<String> {
        let mut refs = Vec::new();
        for key in ["locations", "characters", "props"] {
            if let Some(tags) = frame["tags"][key].as_array() {
                for tag in tags.iter().filter_map(|t| t.as_str()) {
                    let rel = format!("references/{}.png", tag);
                    if self.ctx.store.exists(&self.ctx.project_dir, &rel).await {
                        refs.push(rel);
                    }
                }
            }
        }
        if let Some(prior) = prior {
            refs.push(prior.to_string());
        }
        refs
    }
}

#[async_trait]
impl Stage for GenerateImages {
    fn name(&self) -> &str {
        "Generate Images"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let script = self
            .ctx
            .require_json("storyboard/visual_script.json", SCRIPT_MISSING)
            .await?;
        let frames = selected_frames(&self.ctx, &script);
        let total = frames.len() as u64;

        let mut completed = 0u64;
        let mut failed = 0u64;
        let mut prompts_log = Vec::new();
        let mut prior_frame: Option<String> = None;
        let mut current_scene: Option<i64> = None;

        for frame in &frames {
            if progress.is_cancelled() {
                progress.log(format!("Cancelled after {} frames", completed));
                return Ok(());
            }

            let frame_id = frame["frame_id"].as_str().unwrap_or("frame").to_string();
            let scene = frame["scene_number"].as_i64().unwrap_or(1);
            let prompt = frame["prompt"].as_str().unwrap_or_default().to_string();

            // Continuity reference resets on scene change.
            if current_scene != Some(scene) {
                prior_frame = None;
                current_scene = Some(scene);
            }

            progress.set_item(Some(&frame_id), completed, total);
            let references = self.frame_references(frame, prior_frame.as_deref()).await;
            prompts_log.push(json!({
                "frame_id": frame_id,
                "prompt": prompt,
                "references": references,
            }));

            let rel = format!("storyboard_output/generated/{}.png", frame_id);
            match self.ctx.generate_image(prompt, references).await {
                Ok(bytes) => {
                    self.ctx
                        .store
                        .write_bytes(&self.ctx.project_dir, &rel, &bytes)
                        .await
                        .map_err(|e| StageError::Failed(e.to_string()))?;
                    prior_frame = Some(rel);
                    completed += 1;
                    progress.set_item(Some(&frame_id), completed, total);
                }
                Err(e) => {
                    failed += 1;
                    progress.log(format!("Failed {}: {}", frame_id, e));
                }
            }
        }

        self.ctx
            .write_json(
                "storyboard_output/prompts_log.json",
                &json!({ "prompts": prompts_log }),
            )
            .await?;
        progress.log(format!(
            "Generated {}/{} frames ({} failed)",
            completed, total, failed
        ));
        Ok(())
    }
}

struct SaveOutputs {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for SaveOutputs {
    fn name(&self) -> &str {
        "Save Outputs"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let generated = self
            .ctx
            .store
            .list(&self.ctx.project_dir, "storyboard_output/generated")
            .await
            .map_err(|e| StageError::Failed(e.to_string()))?;

        self.ctx
            .write_json(
                "storyboard_output/summary.json",
                &json!({
                    "generated": generated.len(),
                    "files": generated,
                }),
            )
            .await?;
        progress.log(format!(
            "Storyboard complete! {} frames on disk",
            generated.len()
        ));
        Ok(())
    }
}
