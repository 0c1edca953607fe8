use chrono::{DateTime, Utc};

use super::{LogEntry, PipelineKind, RunId, RunStatus, Snapshot, StageState, StageStatus};

/// The record of one pipeline invocation. Exactly one runner task mutates a
/// record for its whole lifetime; everyone else reads it through `snapshot`.
/// After a terminal status nothing changes any more.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: RunId,
    pub kind: PipelineKind,
    pub name: String,
    pub status: RunStatus,
    pub stages: Vec<StageState>,
    pub current_stage: Option<String>,
    pub progress: f64,
    pub message: String,
    pub total_items: u64,
    pub completed_items: u64,
    pub current_item: Option<String>,
    pub logs: Vec<LogEntry>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new(kind: PipelineKind, name: impl Into<String>, stage_names: Vec<String>) -> Self {
        Self {
            id: RunId::new(),
            kind,
            name: name.into(),
            status: RunStatus::Queued,
            stages: stage_names.into_iter().map(StageState::new).collect(),
            current_stage: None,
            progress: 0.0,
            message: String::new(),
            total_items: 0,
            completed_items: 0,
            current_item: None,
            logs: Vec::new(),
            error: None,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Append a log line, assigning the next sequence number. The latest line
    /// is mirrored into `message` for the UI header.
    pub fn append_log(&mut self, text: impl Into<String>) -> u64 {
        let text = text.into();
        let sequence = self.logs.len() as u64 + 1;
        self.message = text.clone();
        self.logs.push(LogEntry {
            sequence,
            timestamp: Utc::now(),
            text,
        });
        sequence
    }

    /// Raise `progress` to `fraction`, clamped to [current, 1.0]. Progress
    /// never moves backwards and never changes after a terminal status.
    pub fn set_progress(&mut self, fraction: f64) {
        if self.status.is_terminal() {
            return;
        }
        self.progress = fraction.clamp(0.0, 1.0).max(self.progress);
    }

    pub fn set_items(&mut self, current: Option<&str>, completed: u64, total: u64) {
        if self.status.is_terminal() {
            return;
        }
        self.completed_items = completed;
        self.total_items = total;
        if let Some(label) = current {
            self.current_item = Some(label.to_string());
        }
    }

    pub fn begin_stage(&mut self, index: usize) {
        if let Some(stage) = self.stages.get_mut(index) {
            stage.status = StageStatus::Running;
            stage.started_at = Some(Utc::now());
            self.current_stage = Some(stage.name.clone());
        }
    }

    pub fn complete_stage(&mut self, index: usize) {
        if let Some(stage) = self.stages.get_mut(index) {
            stage.status = StageStatus::Complete;
            stage.completed_at = Some(Utc::now());
        }
    }

    pub fn fail_stage(&mut self, index: usize, message: impl Into<String>) {
        if let Some(stage) = self.stages.get_mut(index) {
            stage.status = StageStatus::Error;
            stage.message = Some(message.into());
            stage.completed_at = Some(Utc::now());
        }
    }

    pub fn mark_initializing(&mut self) {
        if !self.status.is_terminal() {
            self.status = RunStatus::Initializing;
        }
    }

    pub fn mark_running(&mut self) {
        if !self.status.is_terminal() {
            self.status = RunStatus::Running;
        }
    }

    pub fn mark_complete(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = RunStatus::Complete;
        self.progress = 1.0;
        self.ended_at = Some(Utc::now());
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = RunStatus::Error;
        self.error = Some(message.into());
        self.ended_at = Some(Utc::now());
    }

    pub fn mark_cancelled(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = RunStatus::Cancelled;
        self.ended_at = Some(Utc::now());
    }

    /// Consistent point-in-time read. `logs_since` holds every entry with a
    /// sequence number greater than `since`; sequences are gap-free, so the
    /// cursor doubles as an index into the log vector.
    pub fn snapshot(&self, since: u64) -> Snapshot {
        let from = (since as usize).min(self.logs.len());
        Snapshot {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            stages: self.stages.clone(),
            current_stage: self.current_stage.clone(),
            total_items: self.total_items,
            completed_items: self.completed_items,
            current_item: self.current_item.clone(),
            logs_since: self.logs[from..].to_vec(),
            next_since: self.logs.len() as u64,
            error: self.error.clone(),
            created_at: self.created_at,
            ended_at: self.ended_at,
        }
    }
}
