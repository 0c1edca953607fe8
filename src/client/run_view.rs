use std::str::FromStr;

use crate::domain::RunStatus;
use crate::presentation::handlers::pipeline_types::{StageResponse, StatusResponse};

/// The only state a client persists across a page reload. Everything else
/// is rebuilt from polled snapshots.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub pipeline_id: String,
    pub kind: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Polling,
    Finished,
    Lost,
}

/// Client-side view of a run, rebuilt purely from snapshots. Applying the
/// full history (cursor 0) after a reload and applying incremental polls
/// converge on the same state; the server's gap-free sequences mean no
/// deduplication is ever needed.
#[derive(Debug, Clone)]
pub struct RunView {
    stored: StoredRun,
    phase: ViewPhase,
    cursor: u64,
    logs: Vec<String>,
    progress: f64,
    status: RunStatus,
    stages: Vec<StageResponse>,
    error: Option<String>,
}

impl RunView {
    pub fn new(stored: StoredRun) -> Self {
        Self {
            stored,
            phase: ViewPhase::Polling,
            cursor: 0,
            logs: Vec::new(),
            progress: 0.0,
            status: RunStatus::Queued,
            stages: Vec::new(),
            error: None,
        }
    }

    /// Forget everything but the stored identity, as a remount does. The
    /// next poll must use cursor 0 and returns the full history.
    pub fn resync(&mut self) {
        self.phase = ViewPhase::Polling;
        self.cursor = 0;
        self.logs.clear();
        self.progress = 0.0;
        self.status = RunStatus::Queued;
        self.stages.clear();
        self.error = None;
    }

    /// Merge one snapshot. New log lines append in order; the cursor
    /// advances to the server's `next_since`.
    pub fn apply(&mut self, snapshot: &StatusResponse) {
        for line in &snapshot.logs_since {
            self.logs.push(line.text.clone());
        }
        self.cursor = snapshot.next_since;
        self.progress = snapshot.progress;
        self.stages = snapshot.stages.clone();
        self.error = snapshot.error.clone();
        if let Ok(status) = RunStatus::from_str(&snapshot.status) {
            self.status = status;
            if status.is_terminal() {
                self.phase = ViewPhase::Finished;
            }
        }
    }

    /// The run vanished (swept or never existed): mark it lost and stop
    /// polling. Never assume a run is alive without a successful snapshot.
    pub fn mark_lost(&mut self) {
        self.phase = ViewPhase::Lost;
        self.status = RunStatus::Error;
        self.error = Some("Pipeline no longer available".to_string());
    }

    pub fn stored(&self) -> &StoredRun {
        &self.stored
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn stages(&self) -> &[StageResponse] {
        &self.stages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True once polling should stop: terminal status or lost run.
    pub fn is_settled(&self) -> bool {
        self.phase != ViewPhase::Polling
    }
}
