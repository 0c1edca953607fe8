use chrono::{DateTime, Utc};

use super::{LogEntry, PipelineKind, RunId, RunStatus, StageState};

/// Point-in-time view of a run, taken under a single read lock. A client
/// polling with its last `next_since` receives only log lines it has not
/// seen yet.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: RunId,
    pub kind: PipelineKind,
    pub name: String,
    pub status: RunStatus,
    pub progress: f64,
    pub message: String,
    pub stages: Vec<StageState>,
    pub current_stage: Option<String>,
    pub total_items: u64,
    pub completed_items: u64,
    pub current_item: Option<String>,
    pub logs_since: Vec<LogEntry>,
    pub next_since: u64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}
