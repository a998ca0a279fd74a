//! Durable job table
//!
//! The whole table is rewritten on every mutation. Writes go to a temporary
//! sibling first and are renamed into place, so a crash mid-write leaves the
//! previous table intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::AnalysisJob;

/// Job store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job store I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Job store is corrupt ({path}): {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Job store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence for the full job table
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Read every stored job; an absent store is an empty table
    async fn load(&self) -> Result<Vec<AnalysisJob>, StoreError>;

    /// Replace the stored table with `jobs`
    async fn save(&self, jobs: &[AnalysisJob]) -> Result<(), StoreError>;
}

/// Pretty-printed JSON array on disk
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl JobStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, jobs: &[AnalysisJob]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(jobs)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }
}
