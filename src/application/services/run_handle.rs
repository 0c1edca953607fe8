use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::domain::{PipelineRun, Snapshot};

/// The registry's per-run cell: the record behind a read-write lock plus the
/// cancellation flag. The lock is only ever held for shallow field updates
/// or a snapshot clone, never across an await point. The flag lives outside
/// the lock so `cancel` never contends with the runner.
pub struct RunHandle {
    state: RwLock<PipelineRun>,
    cancel_requested: AtomicBool,
}

impl RunHandle {
    pub fn new(run: PipelineRun) -> Self {
        Self {
            state: RwLock::new(run),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Mutate the record under the write lock. Callers must not await inside
    /// the closure.
    pub fn update<R>(&self, f: impl FnOnce(&mut PipelineRun) -> R) -> R {
        f(&mut self.state.write())
    }

    pub fn snapshot(&self, since: u64) -> Snapshot {
        self.state.read().snapshot(since)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.read().status.is_terminal()
    }

    pub fn ended_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.state.read().ended_at
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}
