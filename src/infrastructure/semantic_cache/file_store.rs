//! Single-file JSON snapshot store

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::DomainError;
use crate::domain::semantic_cache::{CacheSnapshot, CacheStore};

/// Stores the whole cache as one JSON document.
///
/// Writes go to a sibling temp file which is synced and then renamed over the
/// target, so readers only ever see a complete snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileCacheStore {
    path: PathBuf,
}

impl JsonFileCacheStore {
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
            .unwrap_or_else(|| "semantic_cache".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, action: &str, e: std::io::Error) -> DomainError {
        DomainError::internal(format!(
            "Failed to {} {}: {}",
            action,
            self.path.display(),
            e
        ))
    }
}

#[async_trait]
impl CacheStore for JsonFileCacheStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, DomainError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cache snapshot on disk");
                return Ok(None);
            }
            Err(e) => {
                return Err(DomainError::configuration(format!(
                    "Cannot read cache store {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            DomainError::configuration(format!(
                "Cache store {} is corrupt: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), DomainError> {
        let bytes = serde_json::to_vec(snapshot)
            .map_err(|e| DomainError::internal(format!("Failed to encode snapshot: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error("create directory for", e))?;
        }

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp)
            .await
            .map_err(|e| self.write_error("create temp file for", e))?;

        file.write_all(&bytes)
            .await
            .map_err(|e| self.write_error("write", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.write_error("sync", e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.write_error("replace", e))?;

        debug!(
            path = %self.path.display(),
            entries = snapshot.entries.len(),
            bytes = bytes.len(),
            "Cache snapshot written"
        );

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
