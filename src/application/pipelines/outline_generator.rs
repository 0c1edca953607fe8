//! Outline Generator pipeline: three outline variants from the world config,
//! each with a different narrative approach.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const WORLD_CONFIG_MISSING: &str = "No world config found. Run World Builder first.";

const VARIANTS: [(&str, &str, &str); 3] = [
    ("dramatic_arc", "Dramatic Arc", "classic three-act structure"),
    ("mystery_unfolding", "Mystery Unfolding", "revelation-based progression"),
    ("character_journey", "Character Journey", "internal transformation focus"),
];

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(LoadWorldConfig {
        ctx: Arc::clone(&ctx),
    })];
    for (key, title, approach) in VARIANTS {
        stages.push(Box::new(GenerateVariant {
            ctx: Arc::clone(&ctx),
            key,
            title,
            approach,
            stage_name: format!("Generate {}", title),
        }));
    }
    stages.push(Box::new(SaveVariants { ctx }));
    stages
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
        progress.log(format!(
            "Loaded world config with {} tags",
            config["all_tags"].as_array().map_or(0, |a| a.len())
        ));
        Ok(())
    }
}

struct GenerateVariant {
    ctx: Arc<PipelineContext>,
    key: &'static str,
    title: &'static str,
    approach: &'static str,
    stage_name: String,
}

#[async_trait]
impl Stage for GenerateVariant {
    fn name(&self) -> &str {
        &self.stage_name
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let config = self
            .ctx
            .require_json("world_bible/world_config.json", WORLD_CONFIG_MISSING)
            .await?;

        progress.set_message(format!("Generating {} outline", self.title));
        let response = self
            .ctx
            .complete(
                &format!(
                    "Outline this story as a {}. One beat per line.\n\
                     World context: {}\nEntities: {}",
                    self.approach,
                    config["world_context"].as_str().unwrap_or_default(),
                    config["all_tags"]
                ),
                "You are a story editor. Respond with beats only, one per line.",
            )
            .await?;

        let beats: Vec<String> = response
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();

        self.ctx
            .write_json(
                &format!("outlines/variant_{}.json", self.key),
                &json!({
                    "name": self.title,
                    "approach": self.approach,
                    "beat_count": beats.len(),
                    "beats": beats,
                }),
            )
            .await?;
        progress.log(format!("[OK] {}: {} beats", self.title, beats.len()));
        Ok(())
    }
}

struct SaveVariants {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for SaveVariants {
    fn name(&self) -> &str {
        "Save Variants"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let mut variants = serde_json::Map::new();
        let mut total_beats = 0usize;

        for (key, _, _) in VARIANTS {
            let variant = self
                .ctx
                .require_json(
                    &format!("outlines/variant_{}.json", key),
                    "Variant missing; earlier stage did not write it.",
                )
                .await?;
            total_beats += variant["beat_count"].as_u64().unwrap_or(0) as usize;
            variants.insert(key.to_string(), variant);
        }

        self.ctx
            .write_json(
                "outlines/outline_variants.json",
                &json!({
                    "variants": Value::Object(variants),
                    "selected_variant": Value::Null,
                    "confirmed_beats": [],
                    "status": "pending_selection",
                }),
            )
            .await?;
        progress.log(format!(
            "Generated 3 variants with {} total beats",
            total_beats
        ));
        Ok(())
    }
}
