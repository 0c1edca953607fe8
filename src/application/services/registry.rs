use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::Instrument;

use crate::application::ports::Stage;
use crate::domain::{PipelineKind, PipelineRun, RunId, Snapshot};

use super::run_handle::RunHandle;
use super::runner;

/// Outcome of a cancellation request. Requesting again on a finished run is
/// a no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Requested,
    AlreadyTerminal,
    NotFound,
}

/// Process-wide table of pipeline runs. Creation spawns the run's dedicated
/// runner task; the spawn happens exactly once per id, so no run ever has
/// two runners. Terminal runs are garbage collected by `sweep` after the
/// retention window.
pub struct PipelineRegistry {
    runs: RwLock<HashMap<RunId, Arc<RunHandle>>>,
    retention: chrono::Duration,
}

impl PipelineRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::hours(1)),
        }
    }

    /// Register a run and start its runner. Returns immediately; the stages
    /// execute on their own task.
    pub fn start(
        &self,
        kind: PipelineKind,
        name: impl Into<String>,
        stages: Vec<Box<dyn Stage>>,
    ) -> RunId {
        let stage_names = stages.iter().map(|s| s.name().to_string()).collect();
        let run = PipelineRun::new(kind, name, stage_names);
        let id = run.id;

        let handle = Arc::new(RunHandle::new(run));
        self.runs.write().insert(id, Arc::clone(&handle));

        let span = tracing::info_span!("pipeline_run", run_id = %id, kind = %kind);
        tokio::spawn(runner::execute(handle, stages).instrument(span));

        id
    }

    pub fn snapshot(&self, id: RunId, since: u64) -> Option<Snapshot> {
        let handle = self.runs.read().get(&id).cloned()?;
        Some(handle.snapshot(since))
    }

    pub fn cancel(&self, id: RunId) -> CancelOutcome {
        let Some(handle) = self.runs.read().get(&id).cloned() else {
            return CancelOutcome::NotFound;
        };
        if handle.is_terminal() {
            return CancelOutcome::AlreadyTerminal;
        }
        handle.request_cancel();
        CancelOutcome::Requested
    }

    /// Drop terminal runs whose `ended_at` is older than the retention
    /// window. Returns how many were removed. Clients polling a swept id get
    /// NotFound and stop.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let mut runs = self.runs.write();
        let before = runs.len();
        runs.retain(|_, handle| match handle.ended_at() {
            Some(ended) => ended > cutoff,
            None => true,
        });
        let removed = before - runs.len();
        if removed > 0 {
            tracing::debug!(removed, "Swept finished pipeline runs");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// Background sweeping on a fixed interval, spawned once at startup.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.sweep(Utc::now());
            }
        })
    }
}
