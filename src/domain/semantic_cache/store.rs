//! Persistence contract for the semantic cache

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::domain::DomainError;

pub const SNAPSHOT_VERSION: u32 = 1;

/// The whole cache as written to its backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub version: u32,
    pub dimension: usize,
    pub entries: Vec<CacheEntry>,
}

impl CacheSnapshot {
    pub fn new(dimension: usize, entries: Vec<CacheEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            dimension,
            entries,
        }
    }

    /// Reject snapshots this build cannot serve from
    pub fn validate(&self, expected_dimension: usize) -> Result<(), DomainError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(DomainError::configuration(format!(
                "Unsupported cache snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }

        if self.dimension != expected_dimension {
            return Err(DomainError::configuration(format!(
                "Cache snapshot dimension {} does not match configured dimension {}",
                self.dimension, expected_dimension
            )));
        }

        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| e.embedding().len() != expected_dimension)
        {
            return Err(DomainError::configuration(format!(
                "Cache entry {} has dimension {} (expected {})",
                bad.id(),
                bad.embedding().len(),
                expected_dimension
            )));
        }

        Ok(())
    }
}

/// Where snapshots live between restarts
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> Result<Option<CacheSnapshot>, DomainError>;

    /// Replace the stored snapshot; must be durable on success
    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), DomainError>;

    /// Human-readable location, reported in stats
    fn describe(&self) -> String;
}
