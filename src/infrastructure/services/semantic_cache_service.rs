//! Semantic answer cache
//!
//! Holds every cached answer in memory and mirrors each change to a durable
//! [`CacheStore`]. Lookups are a linear scan over L2-normalized embeddings,
//! which is fine at the few-thousand-entry scale the cache targets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::embedding::vector::{l2_normalize, similarity_from_distance, squared_distance};
use crate::domain::{
    CacheEntry, CacheHit, CacheLookup, CacheSnapshot, CacheStats, CacheStore, DomainError,
    RouteCategory, SemanticCacheConfig, SourceRef,
};
use crate::infrastructure::observability::record_cache_lookup;

#[derive(Debug)]
pub struct SemanticCacheService {
    entries: RwLock<Vec<CacheEntry>>,
    /// Serializes store writes so snapshots land in insertion order
    writer: Mutex<()>,
    store: Arc<dyn CacheStore>,
    config: SemanticCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SemanticCacheService {
    /// Open the cache from `store`.
    ///
    /// A missing snapshot yields an empty cache; a corrupt or mismatched one
    /// is a configuration error.
    pub async fn load(
        config: SemanticCacheConfig,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let mut entries = match store.load().await? {
            Some(snapshot) => {
                snapshot.validate(config.embedding_dimension)?;
                snapshot.entries
            }
            None => Vec::new(),
        };

        let evicted = eviction_candidates(&entries, config.max_entries, 0);
        if !evicted.is_empty() {
            entries.retain(|e| !evicted.iter().any(|id| id == e.id()));
            warn!(
                evicted = evicted.len(),
                max_entries = ?config.max_entries,
                "Snapshot exceeds cache capacity; dropped least recently used entries"
            );
        }

        info!(
            store = %store.describe(),
            entries = entries.len(),
            threshold = config.similarity_threshold,
            dimension = config.embedding_dimension,
            "Semantic cache loaded"
        );

        Ok(Self {
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
            store,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.config.embedding_dimension
    }

    pub fn len(&self) -> usize {
        self.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<CacheEntry>>, DomainError> {
        self.entries
            .read()
            .map_err(|_| DomainError::internal("Semantic cache lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<CacheEntry>>, DomainError> {
        self.entries
            .write()
            .map_err(|_| DomainError::internal("Semantic cache lock poisoned"))
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), DomainError> {
        if embedding.len() != self.config.embedding_dimension {
            return Err(DomainError::configuration(format!(
                "Embedding has {} dimensions, cache expects {}",
                embedding.len(),
                self.config.embedding_dimension
            )));
        }
        Ok(())
    }

    /// Closest entry at or above the similarity threshold.
    ///
    /// Ties go to the smaller distance, then the most recently hit entry,
    /// then the earliest inserted one. A hit bumps the entry's counters.
    pub fn lookup(&self, embedding: &[f32]) -> Result<CacheLookup, DomainError> {
        self.check_dimension(embedding)?;
        let query = l2_normalize(embedding);

        let best = {
            let entries = self.read()?;
            let mut best: Option<(usize, f32, Option<DateTime<Utc>>)> = None;

            for (idx, entry) in entries.iter().enumerate() {
                let distance = squared_distance(&query, entry.embedding());
                let replace = match best {
                    None => true,
                    Some((_, best_distance, best_hit)) => {
                        match distance.total_cmp(&best_distance) {
                            std::cmp::Ordering::Less => true,
                            std::cmp::Ordering::Greater => false,
                            std::cmp::Ordering::Equal => entry.last_hit_at() > best_hit,
                        }
                    }
                };

                if replace {
                    best = Some((idx, distance, entry.last_hit_at()));
                }
            }

            best.map(|(idx, distance, _)| (entries[idx].id().to_string(), distance))
        };

        let hit = match best {
            Some((id, distance))
                if similarity_from_distance(distance) >= self.config.similarity_threshold =>
            {
                let mut entries = self.write()?;
                entries.iter_mut().find(|e| e.id() == id).map(|entry| {
                    entry.record_hit(Utc::now());
                    CacheHit {
                        entry: entry.clone(),
                        similarity: similarity_from_distance(distance),
                        distance,
                    }
                })
            }
            _ => None,
        };

        record_cache_lookup(hit.is_some());

        match hit {
            Some(hit) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(entry_id = %hit.entry.id(), similarity = hit.similarity, "Cache hit");
                Ok(CacheLookup::Hit(hit))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss");
                Ok(CacheLookup::Miss)
            }
        }
    }

    /// Store a new answer.
    ///
    /// The entry is always kept in memory. When the durable write fails the
    /// call returns `CacheWriteDegraded` and the entry lives until restart.
    pub async fn insert(
        &self,
        question: &str,
        embedding: &[f32],
        answer: &str,
        sources: Vec<SourceRef>,
        category: RouteCategory,
    ) -> Result<CacheEntry, DomainError> {
        self.check_dimension(embedding)?;
        let entry = CacheEntry::new(question, l2_normalize(embedding), answer, sources, category);

        let guard = self.writer.lock().await;
        self.write_entry(entry, guard).await
    }

    /// [`Self::insert`] that gives up while waiting for the writer when `cancel` fires.
    ///
    /// Once the store write starts it runs to completion. Returns `None` when skipped.
    pub async fn insert_unless_cancelled(
        &self,
        question: &str,
        embedding: &[f32],
        answer: &str,
        sources: Vec<SourceRef>,
        category: RouteCategory,
        cancel: &CancellationToken,
    ) -> Result<Option<CacheEntry>, DomainError> {
        self.check_dimension(embedding)?;
        let entry = CacheEntry::new(question, l2_normalize(embedding), answer, sources, category);

        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Insert skipped; query cancelled");
                return Ok(None);
            }
            guard = self.writer.lock() => guard,
        };

        self.write_entry(entry, guard).await.map(Some)
    }

    async fn write_entry(
        &self,
        entry: CacheEntry,
        _guard: MutexGuard<'_, ()>,
    ) -> Result<CacheEntry, DomainError> {
        let category = entry.category();
        let (snapshot, evicted) = {
            let entries = self.read()?;
            let evicted = eviction_candidates(&entries, self.config.max_entries, 1);
            let mut next: Vec<CacheEntry> = entries
                .iter()
                .filter(|e| !evicted.iter().any(|id| id == e.id()))
                .cloned()
                .collect();
            next.push(entry.clone());
            (CacheSnapshot::new(self.config.embedding_dimension, next), evicted)
        };

        let saved = self.store.save(&snapshot).await;

        {
            let mut entries = self.write()?;
            entries.retain(|e| !evicted.iter().any(|id| id == e.id()));
            entries.push(entry.clone());
        }

        for id in &evicted {
            debug!(entry_id = %id, "Evicted least recently used cache entry");
        }

        match saved {
            Ok(()) => {
                debug!(entry_id = %entry.id(), category = %category, "Cached answer");
                Ok(entry)
            }
            Err(e) => {
                warn!(error = %e, store = %self.store.describe(), "Cache write failed; entry kept in memory only");
                Err(DomainError::cache_write_degraded(e.detail()))
            }
        }
    }

    /// Write the current entries, hit counters included, to the store
    pub async fn persist(&self) -> Result<(), DomainError> {
        let _guard = self.writer.lock().await;
        let snapshot = CacheSnapshot::new(self.config.embedding_dimension, self.read()?.clone());

        self.store
            .save(&snapshot)
            .await
            .map_err(|e| DomainError::cache_write_degraded(e.detail()))?;

        info!(entries = snapshot.entries.len(), store = %self.store.describe(), "Semantic cache persisted");
        Ok(())
    }

    /// Drop every entry. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize, DomainError> {
        let _guard = self.writer.lock().await;

        let removed = {
            let mut entries = self.write()?;
            let removed = entries.len();
            entries.clear();
            removed
        };

        self.store
            .save(&CacheSnapshot::new(self.config.embedding_dimension, Vec::new()))
            .await
            .map_err(|e| DomainError::cache_write_degraded(e.detail()))?;

        info!(removed, "Semantic cache cleared");
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.len(),
            threshold: self.config.similarity_threshold,
            embedding_dimension: self.config.embedding_dimension,
            backing_store: self.store.describe(),
            max_entries: self.config.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Ids of the least recently used entries that must go so `incoming` more fit under `max_entries`.
///
/// Ties on last use drop the earliest inserted entry first.
fn eviction_candidates(
    entries: &[CacheEntry],
    max_entries: Option<usize>,
    incoming: usize,
) -> Vec<String> {
    let Some(max) = max_entries else {
        return Vec::new();
    };
    let excess = (entries.len() + incoming).saturating_sub(max);
    if excess == 0 {
        return Vec::new();
    }

    let mut by_age: Vec<&CacheEntry> = entries.iter().collect();
    by_age.sort_by_key(|e| e.last_used_at());
    by_age
        .into_iter()
        .take(excess)
        .map(|e| e.id().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::infrastructure::semantic_cache::{InMemoryCacheStore, JsonFileCacheStore};

    const DIM: usize = 4;

    fn config() -> SemanticCacheConfig {
        SemanticCacheConfig::default().with_embedding_dimension(DIM)
    }

    async fn service(config: SemanticCacheConfig) -> (SemanticCacheService, Arc<InMemoryCacheStore>) {
        let store = Arc::new(InMemoryCacheStore::new());
        let service = SemanticCacheService::load(config, store.clone()).await.unwrap();
        (service, store)
    }

    async fn put(service: &SemanticCacheService, question: &str, embedding: [f32; DIM]) -> CacheEntry {
        service
            .insert(question, &embedding, &format!("answer to {}", question), vec![], RouteCategory::DocumentQuery)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_exact_match_hits() {
        let (cache, _) = service(config()).await;
        put(&cache, "Uber revenue", [1.0, 2.0, 0.0, 0.0]).await;

        let hit = cache.lookup(&[2.0, 4.0, 0.0, 0.0]).unwrap().into_hit().unwrap();

        assert_eq!(hit.entry.question_text(), "Uber revenue");
        assert!((hit.similarity - 1.0).abs() < 1e-6);
        assert_eq!(hit.entry.hit_count(), 1);
    }

    #[tokio::test]
    async fn test_dissimilar_misses() {
        let (cache, _) = service(config()).await;
        put(&cache, "Uber revenue", [1.0, 0.0, 0.0, 0.0]).await;

        // orthogonal: distance 2, similarity 0.5
        assert!(!cache.lookup(&[0.0, 1.0, 0.0, 0.0]).unwrap().is_hit());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_empty_cache_misses() {
        let (cache, _) = service(config()).await;
        assert!(!cache.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_closest_entry_wins() {
        let (cache, _) = service(config().with_similarity_threshold(0.0)).await;
        put(&cache, "far", [0.0, 1.0, 0.0, 0.0]).await;
        put(&cache, "near", [1.0, 0.1, 0.0, 0.0]).await;

        let hit = cache.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().into_hit().unwrap();
        assert_eq!(hit.entry.question_text(), "near");
    }

    #[tokio::test]
    async fn test_tie_prefers_recently_hit_then_earliest() {
        let (cache, _) = service(config()).await;
        let first = put(&cache, "first", [1.0, 0.0, 0.0, 0.0]).await;
        let second = put(&cache, "second", [1.0, 0.0, 0.0, 0.0]).await;

        let hit = cache.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().into_hit().unwrap();
        assert_eq!(hit.entry.id(), first.id());

        // the first entry now has a hit time, so it keeps winning
        let hit = cache.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().into_hit().unwrap();
        assert_eq!(hit.entry.id(), first.id());
        assert_ne!(hit.entry.id(), second.id());
        assert_eq!(hit.entry.hit_count(), 2);
    }

    #[tokio::test]
    async fn test_raising_threshold_never_adds_hits() {
        let samples = [
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 0.5, 0.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, 1.0, 0.0],
            [-1.0, 0.2, 0.0, 0.0],
        ];

        let mut previous: Option<Vec<bool>> = None;
        for threshold in [0.0, 0.5, 0.8, 0.95, 1.0] {
            let (cache, _) = service(config().with_similarity_threshold(threshold)).await;
            put(&cache, "anchor", [1.0, 0.0, 0.0, 0.0]).await;

            let hits: Vec<bool> = samples
                .iter()
                .map(|p| cache.lookup(p).unwrap().is_hit())
                .collect();

            if let Some(prev) = previous {
                for (before, now) in prev.iter().zip(&hits) {
                    assert!(!now || *before, "threshold {} produced a new hit", threshold);
                }
            }
            previous = Some(hits);
        }
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_config_error() {
        let (cache, _) = service(config()).await;

        let err = cache.lookup(&[1.0, 0.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);

        let err = cache
            .insert("q", &[1.0; 8], "a", vec![], RouteCategory::WebQuery)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn test_insert_writes_snapshot() {
        let (cache, store) = service(config()).await;
        put(&cache, "a", [1.0, 0.0, 0.0, 0.0]).await;
        put(&cache, "b", [0.0, 1.0, 0.0, 0.0]).await;

        let snapshot = store.current().unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.dimension, DIM);
        assert_eq!(store.saves(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_entry_in_memory() {
        let (cache, store) = service(config()).await;
        store.set_fail_writes(true);

        let err = cache
            .insert("q", &[1.0, 0.0, 0.0, 0.0], "a", vec![], RouteCategory::WebQuery)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CacheWriteDegraded);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_writer_skips_insert() {
        let (cache, store) = service(config()).await;
        let cancel = CancellationToken::new();

        let busy = cache.writer.lock().await;
        let insert = cache.insert_unless_cancelled(
            "q",
            &[1.0, 0.0, 0.0, 0.0],
            "a",
            vec![],
            RouteCategory::WebQuery,
            &cancel,
        );
        let fire = async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            cancel.cancel();
        };
        let (inserted, ()) = tokio::join!(insert, fire);
        drop(busy);

        assert!(inserted.unwrap().is_none());
        assert!(cache.is_empty());
        assert_eq!(store.saves(), 0);

        let live = CancellationToken::new();
        let inserted = cache
            .insert_unless_cancelled("q", &[1.0, 0.0, 0.0, 0.0], "a", vec![], RouteCategory::WebQuery, &live)
            .await
            .unwrap();
        assert!(inserted.is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let (cache, store) = service(config().with_max_entries(2)).await;
        put(&cache, "a", [1.0, 0.0, 0.0, 0.0]).await;
        put(&cache, "b", [0.0, 1.0, 0.0, 0.0]).await;

        // touch "a" so "b" becomes the oldest
        assert!(cache.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().is_hit());
        put(&cache, "c", [0.0, 0.0, 1.0, 0.0]).await;

        assert_eq!(cache.len(), 2);
        assert!(!cache.lookup(&[0.0, 1.0, 0.0, 0.0]).unwrap().is_hit());
        let stored: Vec<String> = store
            .current()
            .unwrap()
            .entries
            .iter()
            .map(|e| e.question_text().to_string())
            .collect();
        assert_eq!(stored, vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_clear() {
        let (cache, store) = service(config()).await;
        put(&cache, "a", [1.0, 0.0, 0.0, 0.0]).await;

        assert_eq!(cache.clear().await.unwrap(), 1);
        assert!(cache.is_empty());
        assert!(store.current().unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_persist_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        // threshold 0.8 sits at cosine 0.6 against an anchor
        let samples: [[f32; DIM]; 6] = [
            [1.0, 0.0, 0.0, 0.0],
            [0.7, 0.0, 0.714, 0.0],
            [0.55, 0.0, 0.835, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [-1.0, 0.0, 0.0, 0.0],
            [0.1, 1.0, 0.0, 0.0],
        ];
        let decide = |cache: &SemanticCacheService| -> Vec<bool> {
            samples.iter().map(|p| cache.lookup(p).unwrap().is_hit()).collect()
        };

        let before = {
            let store = Arc::new(JsonFileCacheStore::new(&path));
            let cache = SemanticCacheService::load(config(), store).await.unwrap();
            put(&cache, "Uber revenue", [1.0, 0.0, 0.0, 0.0]).await;
            put(&cache, "Lyft revenue", [0.0, 1.0, 0.0, 0.0]).await;
            let decisions = decide(&cache);
            cache.persist().await.unwrap();
            decisions
        };
        assert_eq!(before, vec![true, true, false, false, false, true]);

        let store = Arc::new(JsonFileCacheStore::new(&path));
        let reloaded = SemanticCacheService::load(config(), store).await.unwrap();

        assert_eq!(reloaded.len(), 2);
        assert_eq!(decide(&reloaded), before);

        let hit = reloaded.lookup(&[1.0, 0.0, 0.0, 0.0]).unwrap().into_hit().unwrap();
        assert_eq!(hit.entry.question_text(), "Uber revenue");
    }

    #[tokio::test]
    async fn test_reload_with_lower_capacity_trims_snapshot() {
        let entries: Vec<CacheEntry> = ["a", "b", "c", "d", "e"]
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let mut embedding = vec![0.0; DIM];
                embedding[i % DIM] = 1.0;
                CacheEntry::new(*q, embedding, "answer", vec![], RouteCategory::DocumentQuery)
            })
            .collect();
        let store = Arc::new(InMemoryCacheStore::with_snapshot(CacheSnapshot::new(DIM, entries)));

        let cache = SemanticCacheService::load(config().with_max_entries(2), store)
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);

        put(&cache, "f", [0.0, 0.0, 0.0, 1.0]).await;
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(&[0.0, 0.0, 0.0, 1.0]).unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_config() {
        let mut bad_threshold = config();
        bad_threshold.similarity_threshold = 1.5;
        let err = SemanticCacheService::load(bad_threshold, Arc::new(InMemoryCacheStore::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);

        let mut no_room = config();
        no_room.max_entries = Some(0);
        let err = SemanticCacheService::load(no_room, Arc::new(InMemoryCacheStore::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn test_load_rejects_mismatched_snapshot() {
        let store = Arc::new(InMemoryCacheStore::with_snapshot(CacheSnapshot::new(8, vec![])));
        let err = SemanticCacheService::load(config(), store).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SemanticCacheService::load(config(), Arc::new(JsonFileCacheStore::new(&path)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }
}
