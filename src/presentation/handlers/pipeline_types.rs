//! Wire types shared by the pipeline handlers, the polling client and the
//! tests.

use serde::{Deserialize, Serialize};

use crate::domain::Snapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub project_path: String,
    #[serde(default)]
    pub llm: Option<String>,
    #[serde(default)]
    pub image_model: Option<String>,
    #[serde(default)]
    pub max_frames: Option<usize>,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default = "default_visual_style")]
    pub visual_style: String,
    #[serde(default)]
    pub style_notes: String,
    #[serde(default)]
    pub scene_filter: Option<Vec<i64>>,
    #[serde(default)]
    pub entity_filter: Option<Vec<String>>,
}

fn default_media_type() -> String {
    "standard".to_string()
}

fn default_visual_style() -> String {
    "live_action".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub success: bool,
    pub message: String,
    pub pipeline_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResponse {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub sequence: u64,
    pub timestamp: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub pipeline_id: String,
    pub kind: String,
    pub name: String,
    pub status: String,
    pub progress: f64,
    pub message: String,
    pub stages: Vec<StageResponse>,
    pub current_stage: Option<String>,
    pub total_items: u64,
    pub completed_items: u64,
    pub current_item: Option<String>,
    pub logs_since: Vec<LogLine>,
    pub next_since: u64,
    pub error: Option<String>,
    pub created_at: String,
    pub ended_at: Option<String>,
}

impl StatusResponse {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            pipeline_id: snapshot.id.as_uuid().to_string(),
            kind: snapshot.kind.as_str().to_string(),
            name: snapshot.name.clone(),
            status: snapshot.status.as_str().to_string(),
            progress: snapshot.progress,
            message: snapshot.message.clone(),
            stages: snapshot
                .stages
                .iter()
                .map(|stage| StageResponse {
                    name: stage.name.clone(),
                    status: stage.status.as_str().to_string(),
                    message: stage.message.clone(),
                    started_at: stage.started_at.map(|t| t.to_rfc3339()),
                    completed_at: stage.completed_at.map(|t| t.to_rfc3339()),
                })
                .collect(),
            current_stage: snapshot.current_stage.clone(),
            total_items: snapshot.total_items,
            completed_items: snapshot.completed_items,
            current_item: snapshot.current_item.clone(),
            logs_since: snapshot
                .logs_since
                .iter()
                .map(|entry| LogLine {
                    sequence: entry.sequence,
                    timestamp: entry.timestamp.to_rfc3339(),
                    text: entry.text.clone(),
                })
                .collect(),
            next_since: snapshot.next_since,
            error: snapshot.error.clone(),
            created_at: snapshot.created_at.to_rfc3339(),
            ended_at: snapshot.ended_at.map(|t| t.to_rfc3339()),
        }
    }
}
