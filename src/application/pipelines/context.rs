use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{
    ImageClient, ImageClientError, ImageRequest, LlmClient, LlmClientError, ProjectStore,
    ProjectStoreError, StageError,
};

/// Parameters a start request carries into every stage of a run.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub llm_model: String,
    pub image_model: String,
    pub max_frames: Option<usize>,
    pub media_type: String,
    pub visual_style: String,
    pub style_notes: String,
    pub scene_filter: Option<Vec<i64>>,
    pub entity_filter: Option<Vec<String>>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            llm_model: String::new(),
            image_model: String::new(),
            max_frames: None,
            media_type: "standard".to_string(),
            visual_style: "live_action".to_string(),
            style_notes: String::new(),
            scene_filter: None,
            entity_filter: None,
        }
    }
}

/// Read-only context shared by one run's stages: the project directory, the
/// request parameters and the collaborator ports. Stages talk to the run
/// record only through their `ProgressReporter`, never through this.
pub struct PipelineContext {
    pub project_dir: PathBuf,
    pub params: PipelineParams,
    pub store: Arc<dyn ProjectStore>,
    pub llm: Arc<dyn LlmClient>,
    pub images: Arc<dyn ImageClient>,
}

impl PipelineContext {
    /// Read a JSON artifact, failing with a precondition message when it is
    /// missing. The messages name the upstream pipeline to run first.
    pub async fn require_json(&self, rel: &str, missing: &str) -> Result<Value, StageError> {
        let text = match self.store.read_text(&self.project_dir, rel).await {
            Ok(text) => text,
            Err(ProjectStoreError::NotFound(_)) => {
                return Err(StageError::Precondition(missing.to_string()));
            }
            Err(e) => return Err(StageError::Failed(e.to_string())),
        };
        serde_json::from_str(&text)
            .map_err(|e| StageError::Failed(format!("Failed to parse {}: {}", rel, e)))
    }

    pub async fn require_text(&self, rel: &str, missing: &str) -> Result<String, StageError> {
        match self.store.read_text(&self.project_dir, rel).await {
            Ok(text) => Ok(text),
            Err(ProjectStoreError::NotFound(_)) => {
                Err(StageError::Precondition(missing.to_string()))
            }
            Err(e) => Err(StageError::Failed(e.to_string())),
        }
    }

    pub async fn write_json(&self, rel: &str, value: &Value) -> Result<(), StageError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| StageError::Failed(e.to_string()))?;
        self.store
            .write_text(&self.project_dir, rel, &text)
            .await
            .map_err(|e| StageError::Failed(format!("Failed to write {}: {}", rel, e)))
    }

    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, StageError> {
        self.llm.complete(prompt, system).await.map_err(|e| match e {
            LlmClientError::RateLimited => StageError::Failed("LLM rate limited".to_string()),
            other => StageError::Failed(other.to_string()),
        })
    }

    pub async fn generate_image(
        &self,
        prompt: String,
        references: Vec<String>,
    ) -> Result<Vec<u8>, ImageClientError> {
        let request = ImageRequest {
            prompt,
            model: self.params.image_model.clone(),
            references,
        };
        self.images.generate(&request).await
    }

    /// Style suffix appended to every image prompt, from the request's
    /// visual style plus free-form style notes.
    pub fn style_suffix(&self) -> String {
        let mut suffix = format!(", {} style", self.params.visual_style.replace('_', " "));
        if !self.params.style_notes.is_empty() {
            suffix.push_str(", ");
            suffix.push_str(&self.params.style_notes);
        }
        suffix
    }
}
