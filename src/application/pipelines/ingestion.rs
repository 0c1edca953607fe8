//! Ingestion pipeline: uploaded source material to extracted entities
//! awaiting user confirmation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::ports::{Stage, StageError};
use crate::application::services::ProgressReporter;

use super::context::PipelineContext;

const UPLOADS_MISSING: &str = "No files to process. Upload documents first.";

pub fn stages(ctx: Arc<PipelineContext>) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(ScanUploads { ctx: Arc::clone(&ctx) }),
        Box::new(ExtractText { ctx: Arc::clone(&ctx) }),
        Box::new(ExtractEntities { ctx: Arc::clone(&ctx) }),
        Box::new(SaveResults { ctx }),
    ]
}

fn is_text_file(name: &str) -> bool {
    name.ends_with(".txt") || name.ends_with(".md")
}

struct ScanUploads {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for ScanUploads {
    fn name(&self) -> &str {
        "Scan Uploads"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let files = self
            .ctx
            .store
            .list(&self.ctx.project_dir, "uploads")
            .await
            .map_err(|e| StageError::Failed(e.to_string()))?;
        if files.is_empty() {
            return Err(StageError::Precondition(UPLOADS_MISSING.to_string()));
        }
        progress.log(format!("Found {} uploaded files", files.len()));
        Ok(())
    }
}

struct ExtractText {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for ExtractText {
    fn name(&self) -> &str {
        "Extract Text"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let files = self
            .ctx
            .store
            .list(&self.ctx.project_dir, "uploads")
            .await
            .map_err(|e| StageError::Failed(e.to_string()))?;

        let total = files.len() as u64;
        let mut chunks: Vec<String> = Vec::new();
        let mut processed = 0u64;

        for file in &files {
            if progress.is_cancelled() {
                progress.log(format!("Cancelled after {} files", processed));
                return Ok(());
            }
            progress.set_item(Some(file), processed, total);

            if !is_text_file(file) {
                progress.log(format!("Skipping unsupported file {}", file));
                continue;
            }

            let text = self
                .ctx
                .require_text(&format!("uploads/{}", file), UPLOADS_MISSING)
                .await?;
            chunks.extend(
                text.split("\n\n")
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from),
            );
            processed += 1;
            progress.set_item(Some(file), processed, total);
        }

        self.ctx
            .write_json(
                "ingestion/chunks.json",
                &json!({
                    "total_chunks": chunks.len(),
                    "documents_processed": processed,
                    "chunks": chunks,
                }),
            )
            .await?;
        progress.log(format!(
            "Extracted {} chunks from {} documents",
            chunks.len(),
            processed
        ));
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
        let chunks = self
            .ctx
            .require_json(
                "ingestion/chunks.json",
                "Chunks missing; earlier stage did not write them.",
            )
            .await?;

        let combined = chunks["chunks"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        progress.set_message("Extracting entities from source material");
        let response = self
            .ctx
            .complete(
                &format!(
                    "Identify every character, location and significant prop in \
                     this material. One per line, prefixed CHAR_/LOC_/PROP_:\n\n{}",
                    combined
                ),
                "You are a story entity extractor.",
            )
            .await?;

        let mut characters = Vec::new();
        let mut locations = Vec::new();
        let mut props = Vec::new();
        for line in response.lines().map(str::trim) {
            if line.starts_with("CHAR_") {
                characters.push(line);
            } else if line.starts_with("LOC_") {
                locations.push(line);
            } else if line.starts_with("PROP_") {
                props.push(line);
            }
        }

        self.ctx
            .write_json(
                "ingestion/extracted_entities.json",
                &json!({
                    "status": "pending_confirmation",
                    "characters": characters,
                    "locations": locations,
                    "props": props,
                }),
            )
            .await?;
        progress.log(format!(
            "Extracted {} characters, {} locations, {} props",
            characters.len(),
            locations.len(),
            props.len()
        ));
        Ok(())
    }
}

struct SaveResults {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl Stage for SaveResults {
    fn name(&self) -> &str {
        "Save Results"
    }

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError> {
        let entities = self
            .ctx
            .require_json(
                "ingestion/extracted_entities.json",
                "Extracted entities missing; earlier stage did not write them.",
            )
            .await?;
        let chunks = self
            .ctx
            .require_json(
                "ingestion/chunks.json",
                "Chunks missing; earlier stage did not write them.",
            )
            .await?;

        self.ctx
            .write_json(
                "ingestion/ingestion_result.json",
                &json!({
                    "status": "pending_confirmation",
                    "total_chunks": chunks["total_chunks"],
                    "documents_processed": chunks["documents_processed"],
                    "characters": entities["characters"].as_array().map_or(0, |a| a.len()),
                    "locations": entities["locations"].as_array().map_or(0, |a| a.len()),
                    "props": entities["props"].as_array().map_or(0, |a| a.len()),
                }),
            )
            .await?;
        progress.log("Ingestion results saved; awaiting entity confirmation");
        Ok(())
    }
}
