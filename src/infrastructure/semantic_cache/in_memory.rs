//! Non-durable snapshot store

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::semantic_cache::{CacheSnapshot, CacheStore};

/// Keeps the last snapshot in process memory; used when no cache file is configured
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    snapshot: RwLock<Option<CacheSnapshot>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail, simulating a full or read-only disk
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<CacheSnapshot> {
        self.snapshot.read().ok().and_then(|s| s.clone())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn load(&self) -> Result<Option<CacheSnapshot>, DomainError> {
        self.snapshot
            .read()
            .map(|s| s.clone())
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::internal("in-memory store is refusing writes"));
        }

        let mut slot = self
            .snapshot
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;
        *slot = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
