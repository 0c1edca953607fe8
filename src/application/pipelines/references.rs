//! References pipeline: one reference image per world-bible entity.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const WORLD_CONFIG_MISSING: &str = "No world_config.json found. Run World Builder first.";

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LoadWorldConfig { ctx: Arc::clone(&ctx) }),
        Box::new(GenerateReferences::new(&ctx, "characters", "Character References")),
        Box::new(GenerateReferences::new(&ctx, "locations", "Location References")),
        Box::new(GenerateReferences::new(&ctx, "props", "Prop References")),
    ]
}

struct LoadWorldConfig {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for LoadWorldConfig {
    fn name(&self) -> &str {
        "Load World Config"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let config = self
            .ctx
            .require_json("world_bible/world_config.json", WORLD_CONFIG_MISSING)
            .await?;
        let total: usize = ["characters", "locations", "props"]
            .iter()
            .map(|k| config[*k].as_array().map_or(0, |a| a.len()))
            .sum();
        progress.log(format!("Loaded world config with {} entities", total));
        Ok(())
    }
}

/// Shared loop for the three entity categories. Existing reference images
/// are kept; delete one to have it regenerated on the next run.
struct GenerateReferences {
    ctx: Arc<PipelineContext>,
    category: &'static str,
    stage_name: &'static str,
}

impl GenerateReferences {
    fn new(ctx: &Arc<PipelineContext>, category: &'static str, stage_name: &'static str) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            category,
            stage_name,
        }
    }

    fn wanted(&self, entity: &Value) -> bool {
        let Some(filter) = &self.ctx.params.entity_filter else {
            return true;
        };
        entity["tag"]
            .as_str()
            .is_some_and(|tag| filter.iter().any(|f| f == tag))
    }
}

#[async_trait]
impl Stage for GenerateReferences {
    fn name(&self) -> &str {
        self.stage_name
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let config = self
            .ctx
            .require_json("world_bible/world_config.json", WORLD_CONFIG_MISSING)
            .await?;

        let entities: Vec<Value> = config[self.category]
            .as_array()
            .map(|a| a.iter().filter(|e| self.wanted(e)).cloned().collect())
            .unwrap_or_default();
        let total = entities.len() as u64;
        let style = self.ctx.style_suffix();
        let mut generated = 0u64;

        for (i, entity) in entities.iter().enumerate() {
            if progress.is_cancelled() {
                progress.log(format!("Cancelled after {} images", generated));
                return Ok(());
            }
            let tag = entity["tag"].as_str().unwrap_or("UNKNOWN");
            progress.set_item(Some(tag), i as u64, total);

            let rel = format!("references/{}.png", tag);
            if self.ctx.store.exists(&self.ctx.project_dir, &rel).await {
                progress.log(format!("Skipping {}: reference exists", tag));
                continue;
            }

            let prompt = format!(
                "Reference image of {}: {}{}",
                entity["name"].as_str().unwrap_or(tag),
                entity["description"].as_str().unwrap_or_default(),
                style
            );
            match self.ctx.generate_image(prompt, Vec::new()).await {
                Ok(bytes) => {
                    self.ctx
                        .store
                        .write_bytes(&self.ctx.project_dir, &rel, &bytes)
                        .await
                        .map_err(|e| StageError::Failed(e.to_string()))?;
                    generated += 1;
                    progress.log(format!("[OK] {}", tag));
                }
                Err(e) => {
                    // One failed reference does not sink the batch.
                    progress.log(format!("Failed {}: {}", tag, e));
                }
            }
            progress.set_item(Some(tag), i as u64 + 1, total);
        }

        progress.log(format!(
            "{}: {} of {} generated",
            self.stage_name, generated, total
        ));
        Ok(())
    }
}
