mod log_entry;
mod pipeline_kind;
mod pipeline_run;
mod run_id;
mod run_status;
mod snapshot;
mod stage_state;

pub use log_entry::LogEntry;
pub use pipeline_kind::PipelineKind;
pub use pipeline_run::PipelineRun;
pub use run_id::RunId;
pub use run_status::RunStatus;
pub use snapshot::Snapshot;
pub use stage_state::{StageState, StageStatus};
