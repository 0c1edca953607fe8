use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{ProjectStore, ProjectStoreError};

/// Project artifacts on the local filesystem, rooted at each project's own
/// directory. Parent directories are created on write.
pub struct LocalProjectStore;

impl LocalProjectStore {
    pub fn new() -> Self {
        Self
    }

    fn resolve(project: &Path, rel: &str) -> PathBuf {
        project.join(rel)
    }

    async fn ensure_parent(path: &Path) -> Result<(), ProjectStoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

impl Default for LocalProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for LocalProjectStore {
    async fn read_text(&self, project: &Path, rel: &str) -> Result<String, ProjectStoreError> {
        let path = Self::resolve(project, rel);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ProjectStoreError::NotFound(rel.to_string()))
            }
            Err(e) => Err(ProjectStoreError::Io(e)),
        }
    }

    async fn write_text(
        &self,
        project: &Path,
        rel: &str,
        contents: &str,
    ) -> Result<(), ProjectStoreError> {
        let path = Self::resolve(project, rel);
        Self::ensure_parent(&path).await?;
        tokio::fs::write(&path, contents).await?;
        Ok(())
    }

    async fn write_bytes(
        &self,
        project: &Path,
        rel: &str,
        data: &[u8],
    ) -> Result<(), ProjectStoreError> {
        let path = Self::resolve(project, rel);
        Self::ensure_parent(&path).await?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn exists(&self, project: &Path, rel: &str) -> bool {
        tokio::fs::try_exists(Self::resolve(project, rel))
            .await
            .unwrap_or(false)
    }

    async fn list(&self, project: &Path, rel: &str) -> Result<Vec<String>, ProjectStoreError> {
        let path = Self::resolve(project, rel);
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ProjectStoreError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
