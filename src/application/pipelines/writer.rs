//! Writer pipeline: pitch to world config and story outline.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const PITCH_MISSING: &str = "No pitch found. Create world_bible/pitch.md first.";

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LoadPitch { ctx: Arc::clone(&ctx) }),
        Box::new(ExtractWorldContext { ctx: Arc::clone(&ctx) }),
        Box::new(ExtractEntities { ctx: Arc::clone(&ctx) }),
        Box::new(GenerateStoryOutline { ctx: Arc::clone(&ctx) }),
        Box::new(SaveOutputs { ctx }),
    ]
}

struct LoadPitch {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for LoadPitch {
    fn name(&self) -> &str {
        "Load Pitch"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let pitch = self.ctx.require_text("world_bible/pitch.md", PITCH_MISSING).await?;
        if pitch.trim().is_empty() {
            return Err(StageError::Precondition(PITCH_MISSING.to_string()));
        }
        progress.log(format!("Loaded pitch ({} chars)", pitch.len()));
        Ok(())
    }
}

struct ExtractWorldContext {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for ExtractWorldContext {
    fn name(&self) -> &str {
        "Extract World Context"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let pitch = self.ctx.require_text("world_bible/pitch.md", PITCH_MISSING).await?;
        progress.set_message("Extracting world context from pitch");
        let response = self
            .ctx
            .complete(
                &format!(
                    "Extract the world context (time period, culture, clothing, \
                     architecture, lighting, mood) from this story pitch:\n\n{}",
                    pitch
                ),
                "You are a story world analyst. Answer with concise prose.",
            )
            .await?;
        self.ctx
            .write_json(
                "world_bible/world_context.json",
                &json!({ "world_context": response }),
            )
            .await?;
        progress.log("World context extracted");
        Ok(())
    }
}

struct ExtractEntities {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for ExtractEntities {
    fn name(&self) -> &str {
        "Extract Entities"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let pitch = self.ctx.require_text("world_bible/pitch.md", PITCH_MISSING).await?;
        let response = self
            .ctx
            .complete(
                &format!(
                    "List every character, location and significant prop in this \
                     pitch, one per line, prefixed CHAR_/LOC_/PROP_:\n\n{}",
                    pitch
                ),
                "You are a story entity extractor.",
            )
            .await?;

        let tags: Vec<&str> = response
            .lines()
            .map(str::trim)
            .filter(|l| {
                l.starts_with("CHAR_") || l.starts_with("LOC_") || l.starts_with("PROP_")
            })
            .collect();
        self.ctx
            .write_json(
                "world_bible/entities.json",
                &json!({ "all_tags": tags, "raw": response }),
            )
            .await?;
        progress.log(format!("Extracted {} entities", tags.len()));
        Ok(())
    }
}

struct GenerateStoryOutline {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for GenerateStoryOutline {
    fn name(&self) -> &str {
        "Generate Story Outline"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let pitch = self.ctx.require_text("world_bible/pitch.md", PITCH_MISSING).await?;
        let context = self
            .ctx
            .require_json(
                "world_bible/world_context.json",
                "World context missing; earlier stage did not write it.",
            )
            .await?;

        progress.set_message("Generating story outline");
        let response = self
            .ctx
            .complete(
                &format!(
                    "Write a scene-by-scene outline for a {} story.\n\
                     World context: {}\n\nPitch:\n{}",
                    self.ctx.params.media_type,
                    context["world_context"].as_str().unwrap_or_default(),
                    pitch
                ),
                "You are a screenwriter. One scene per line.",
            )
            .await?;

        let scenes: Vec<String> = response
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        self.ctx
            .write_json(
                "story_outline.json",
                &json!({
                    "total_scenes": scenes.len(),
                    "scenes": scenes,
                    "status": "draft",
                }),
            )
            .await?;
        progress.log(format!("Outlined {} scenes", scenes.len()));
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
        let context = self
            .ctx
            .require_json(
                "world_bible/world_context.json",
                "World context missing; earlier stage did not write it.",
            )
            .await?;
        let entities = self
            .ctx
            .require_json(
                "world_bible/entities.json",
                "Entities missing; earlier stage did not write them.",
            )
            .await?;

        self.ctx
            .write_json(
                "world_bible/world_config.json",
                &json!({
                    "visual_style": self.ctx.params.visual_style,
                    "world_context": context["world_context"],
                    "all_tags": entities["all_tags"],
                    "status": "draft",
                }),
            )
            .await?;
        progress.log("Saved world_bible/world_config.json");
        Ok(())
    }
}
