//! The browser-side half of the resync protocol: a client holds only
//! `{pipeline_id, kind, display_name}` and rebuilds everything else from
//! polled snapshots.

mod run_view;
mod status_poller;

pub use run_view::{RunView, StoredRun, ViewPhase};
pub use status_poller::StatusPoller;
