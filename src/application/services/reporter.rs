use std::sync::Arc;

use super::run_handle::RunHandle;

/// Handle stages use to push progress into their run record. Every method
/// serializes onto the record's lock; stage authors never reason about
/// concurrency themselves.
#[derive(Clone)]
pub struct ProgressReporter {
    handle: Arc<RunHandle>,
}

impl ProgressReporter {
    pub(crate) fn new(handle: Arc<RunHandle>) -> Self {
        Self { handle }
    }

    /// Append a log line with the next sequence number. The latest line also
    /// becomes the run's headline message.
    pub fn log(&self, text: impl Into<String>) {
        self.handle.update(|run| {
            run.append_log(text);
        });
    }

    pub fn set_message(&self, text: impl Into<String>) {
        let text = text.into();
        self.handle.update(|run| run.message = text);
    }

    /// Raise overall progress. Clamped to [last reported, 1.0].
    pub fn set_progress(&self, fraction: f64) {
        self.handle.update(|run| run.set_progress(fraction));
    }

    /// Report per-item counters for stages iterating a known collection.
    /// Progress is derived the same way the item loop band is split overall:
    /// 10% setup, 85% items, the rest on completion.
    pub fn set_item(&self, current: Option<&str>, completed: u64, total: u64) {
        self.handle.update(|run| {
            run.set_items(current, completed, total);
            if total > 0 {
                run.set_progress(0.1 + (completed as f64 / total as f64) * 0.85);
            }
        });
    }

    /// Cooperative cancellation check. Iterating stages call this at each
    /// iteration boundary and return early when it reports true.
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }
}
