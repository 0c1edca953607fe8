use std::path::Path;

use async_trait::async_trait;

/// Access to a project's artifact tree (pitch, world bible, outlines, visual
/// script, generated frames). Paths are relative to the project directory.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn read_text(&self, project: &Path, rel: &str) -> Result<String, ProjectStoreError>;

    async fn write_text(
        &self,
        project: &Path,
        rel: &str,
        contents: &str,
    ) -> Result<(), ProjectStoreError>;

    async fn write_bytes(
        &self,
        project: &Path,
        rel: &str,
        data: &[u8],
    ) -> Result<(), ProjectStoreError>;

    async fn exists(&self, project: &Path, rel: &str) -> bool;

    /// File names directly under `rel`, empty when the directory is missing.
    async fn list(&self, project: &Path, rel: &str) -> Result<Vec<String>, ProjectStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectStoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
