//! World Builder pipeline: confirmed entities to the full world bible.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const ENTITIES_MISSING: &str = "No confirmed entities found. Run ingestion first.";

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LoadConfirmedEntities { ctx: Arc::clone(&ctx) }),
        Box::new(GenerateWorldContext { ctx: Arc::clone(&ctx) }),
        Box::new(EnrichEntities::new(&ctx, "character", "Generate Character Descriptions")),
        Box::new(EnrichEntities::new(&ctx, "location", "Generate Location Descriptions")),
        Box::new(EnrichEntities::new(&ctx, "prop", "Generate Prop Descriptions")),
        Box::new(SaveWorldConfig { ctx }),
    ]
}

fn confirmed_of_type(entities: &Value, entity_type: &str) -> Vec<Value> {
    entities["entities"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter(|e| e["type"].as_str() == Some(entity_type))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

struct LoadConfirmedEntities {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for LoadConfirmedEntities {
    fn name(&self) -> &str {
        "Load Confirmed Entities"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let entities = self
            .ctx
            .require_json("ingestion/confirmed_entities.json", ENTITIES_MISSING)
            .await?;
        let count = entities["entities"].as_array().map_or(0, |a| a.len());
        if count == 0 {
            return Err(StageError::Precondition(ENTITIES_MISSING.to_string()));
        }
        progress.log(format!("Loaded {} confirmed entities", count));
        Ok(())
    }
}

struct GenerateWorldContext {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for GenerateWorldContext {
    fn name(&self) -> &str {
        "Generate World Context"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let entities = self
            .ctx
            .require_json("ingestion/confirmed_entities.json", ENTITIES_MISSING)
            .await?;

        progress.set_message("Generating world context");
        let response = self
            .ctx
            .complete(
                &format!(
                    "Given these confirmed story entities, describe the world: \
                     time period, technology, culture, clothing norms, \
                     architecture, lighting, mood. Entities:\n{}",
                    entities["entities"]
                ),
                &format!(
                    "You are a world-bible author for a {} production.",
                    self.ctx.params.visual_style.replace('_', " ")
                ),
            )
            .await?;

        self.ctx
            .write_json(
                "world_bible/world_context.json",
                &json!({ "world_context": response }),
            )
            .await?;
        progress.log("World context generated");
        Ok(())
    }
}

/// One stage instance per entity category; the loop shape is identical for
/// characters, locations and props.
struct EnrichEntities {
    ctx: Arc<PipelineContext>,
    entity_type: &'static str,
    stage_name: &'static str,
}

impl EnrichEntities {
    fn new(ctx: &Arc<PipelineContext>, entity_type: &'static str, stage_name: &'static str) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            entity_type,
            stage_name,
        }
    }
}

#[async_trait]
impl Stage for EnrichEntities {
    fn name(&self) -> &str {
        self.stage_name
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let entities = self
            .ctx
            .require_json("ingestion/confirmed_entities.json", ENTITIES_MISSING)
            .await?;
        let context = self
            .ctx
            .require_json(
                "world_bible/world_context.json",
                "World context missing; earlier stage did not write it.",
            )
            .await?;

        let of_type = confirmed_of_type(&entities, self.entity_type);
        let total = of_type.len() as u64;
        let mut enriched = Vec::with_capacity(of_type.len());

        for (i, entity) in of_type.iter().enumerate() {
            if progress.is_cancelled() {
                progress.log(format!("Cancelled after {} {}s", i, self.entity_type));
                return Ok(());
            }
            let tag = entity["tag"].as_str().unwrap_or("UNKNOWN");
            progress.set_item(Some(tag), i as u64, total);

            let description = self
                .ctx
                .complete(
                    &format!(
                        "Describe the {} '{}' ({}) for a visual production. World \
                         context: {}",
                        self.entity_type,
                        entity["name"].as_str().unwrap_or(tag),
                        tag,
                        context["world_context"].as_str().unwrap_or_default()
                    ),
                    "You are a world-bible author. Answer in one paragraph.",
                )
                .await?;

            enriched.push(json!({
                "tag": tag,
                "name": entity["name"],
                "description": description,
            }));
            progress.set_item(Some(tag), i as u64 + 1, total);
            progress.log(format!("[OK] {}", tag));
        }

        let mut doc = serde_json::Map::new();
        doc.insert(format!("{}s", self.entity_type), Value::Array(enriched));
        self.ctx
            .write_json(
                &format!("world_bible/{}s.json", self.entity_type),
                &Value::Object(doc),
            )
            .await?;
        Ok(())
    }
}

struct SaveWorldConfig {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for SaveWorldConfig {
    fn name(&self) -> &str {
        "Save World Config"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let context = self
            .ctx
            .require_json(
                "world_bible/world_context.json",
                "World context missing; earlier stage did not write it.",
            )
            .await?;

        let mut config = json!({
            "visual_style": self.ctx.params.visual_style,
            "world_context": context["world_context"],
            "status": "draft",
        });
        let mut all_tags: Vec<Value> = Vec::new();

        for entity_type in ["character", "location", "prop"] {
            let rel = format!("world_bible/{}s.json", entity_type);
            let key = format!("{}s", entity_type);
            let enriched = self
                .ctx
                .require_json(&rel, "Enriched entities missing; earlier stage did not write them.")
                .await?;
            if let Some(list) = enriched[&key].as_array() {
                for entity in list {
                    all_tags.push(entity["tag"].clone());
                }
            }
            config[&key] = enriched[&key].clone();
        }

        let counts = format!(
            "{} characters, {} locations, {} props",
            config["characters"].as_array().map_or(0, |a| a.len()),
            config["locations"].as_array().map_or(0, |a| a.len()),
            config["props"].as_array().map_or(0, |a| a.len()),
        );
        config["all_tags"] = Value::Array(all_tags);

        self.ctx
            .write_json("world_bible/world_config.json", &config)
            .await?;
        progress.log(format!("World Bible complete! {}", counts));
        Ok(())
    }
}
