use async_trait::async_trait;

use crate::application::services::ProgressReporter;

/// One ordered unit of work within a pipeline. Stages receive a
/// `ProgressReporter` handle and are expected to check `is_cancelled` at
/// every iteration boundary when they loop over a known collection.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, progress: &ProgressReporter) -> Result<(), StageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// A required upstream artifact is missing; detected before the stage
    /// does any work.
    #[error("{0}")]
    Precondition(String),
    #[error("{0}")]
    Failed(String),
}
