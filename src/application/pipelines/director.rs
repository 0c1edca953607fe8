//! Director pipeline: confirmed outline to a shot-by-shot visual script.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const OUTLINE_MISSING: &str = "No confirmed outline found. Confirm an outline first.";
const WORLD_CONFIG_MISSING: &str = "No world config found. Run World Builder first.";

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LoadOutline { ctx: Arc::clone(&ctx) }),
        Box::new(AnalyzeScenes { ctx: Arc::clone(&ctx) }),
        Box::new(GenerateVisualScript { ctx: Arc::clone(&ctx) }),
        Box::new(SaveOutputs { ctx }),
    ]
}

fn confirmed_beats(outline: &Value) -> Vec<String> {
    outline["beats"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

struct LoadOutline {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for LoadOutline {
    fn name(&self) -> &str {
        "Load Outline"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let outline = self
            .ctx
            .require_json("outlines/confirmed_outline.json", OUTLINE_MISSING)
            .await?;
        self.ctx
            .require_json("world_bible/world_config.json", WORLD_CONFIG_MISSING)
            .await?;

        let beats = confirmed_beats(&outline);
        if beats.is_empty() {
            return Err(StageError::Precondition(OUTLINE_MISSING.to_string()));
        }
        progress.log(format!("Loaded outline with {} beats", beats.len()));
        Ok(())
    }
}

struct AnalyzeScenes {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for AnalyzeScenes {
    fn name(&self) -> &str {
        "Analyze Scenes"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let outline = self
            .ctx
            .require_json("outlines/confirmed_outline.json", OUTLINE_MISSING)
            .await?;
        let config = self
            .ctx
            .require_json("world_bible/world_config.json", WORLD_CONFIG_MISSING)
            .await?;

        let beats = confirmed_beats(&outline);
        let total = beats.len() as u64;
        let mut analyses = Vec::with_capacity(beats.len());

        for (i, beat) in beats.iter().enumerate() {
            if progress.is_cancelled() {
                progress.log(format!("Cancelled after {} scenes", i));
                return Ok(());
            }
            let label = format!("scene {}", i + 1);
            progress.set_item(Some(&label), i as u64, total);

            let analysis = self
                .ctx
                .complete(
                    &format!(
                        "Break this scene into shots with camera notation \
                         (WS/MS/CU/ECU). World context: {}\nScene: {}",
                        config["world_context"].as_str().unwrap_or_default(),
                        beat
                    ),
                    "You are a film director planning a storyboard.",
                )
                .await?;

            analyses.push(json!({
                "scene_number": i + 1,
                "beat": beat,
                "analysis": analysis,
            }));
            progress.set_item(Some(&label), i as u64 + 1, total);
        }

        self.ctx
            .write_json("storyboard/scene_analysis.json", &json!({ "scenes": analyses }))
            .await?;
        progress.log(format!("Analyzed {} scenes", analyses.len()));
        Ok(())
    }
}

struct GenerateVisualScript {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for GenerateVisualScript {
    fn name(&self) -> &str {
        "Generate Visual Script"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let analysis = self
            .ctx
            .require_json(
                "storyboard/scene_analysis.json",
                "Scene analysis missing; earlier stage did not write it.",
            )
            .await?;

        let style = self.ctx.style_suffix();
        let mut frames = Vec::new();

        if let Some(scenes) = analysis["scenes"].as_array() {
            for scene in scenes {
                let scene_number = scene["scene_number"].as_u64().unwrap_or(1);
                // One frame per shot line of the analysis, camera A.
                let shots: Vec<&str> = scene["analysis"]
                    .as_str()
                    .unwrap_or_default()
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect();
                for (f, shot) in shots.iter().enumerate() {
                    frames.push(json!({
                        "frame_id": format!("{}.{}.cA", scene_number, f + 1),
                        "scene_number": scene_number,
                        "prompt": format!("{}{}", shot, style),
                        "visual_description": shot,
                        "tags": {},
                        "location_direction": "NORTH",
                    }));
                }
            }
        }

        if let Some(max) = self.ctx.params.max_frames {
            if frames.len() > max {
                frames.truncate(max);
                progress.log(format!("Limited to {} frames", max));
            }
        }

        self.ctx
            .write_json("storyboard/frames_draft.json", &json!({ "frames": frames }))
            .await?;
        progress.log(format!("Drafted {} frames", frames.len()));
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
        let draft = self
            .ctx
            .require_json(
                "storyboard/frames_draft.json",
                "Frame draft missing; earlier stage did not write it.",
            )
            .await?;

        let total = draft["frames"].as_array().map_or(0, |a| a.len());
        self.ctx
            .write_json(
                "storyboard/visual_script.json",
                &json!({
                    "total_frames": total,
                    "frames": draft["frames"],
                }),
            )
            .await?;
        progress.log(format!(
            "Director complete! {} frames in visual script",
            total
        ));
        Ok(())
    }
}
