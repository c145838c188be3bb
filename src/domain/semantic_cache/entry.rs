use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::retrieval::SourceRef;
use crate::domain::routing::RouteCategory;

/// A previously produced answer keyed by its question embedding.
///
/// Everything but the hit bookkeeping is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    id: String,
    question_text: String,
    embedding: Vec<f32>,
    answer_text: String,
    sources: Vec<SourceRef>,
    category: RouteCategory,
    created_at: DateTime<Utc>,
    hit_count: u64,
    last_hit_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// `embedding` is stored as given; callers pass it already normalized
    pub fn new(
        question_text: impl Into<String>,
        embedding: Vec<f32>,
        answer_text: impl Into<String>,
        sources: Vec<SourceRef>,
        category: RouteCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question_text: question_text.into(),
            embedding,
            answer_text: answer_text.into(),
            sources,
            category,
            created_at: Utc::now(),
            hit_count: 0,
            last_hit_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    pub fn category(&self) -> RouteCategory {
        self.category
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn last_hit_at(&self) -> Option<DateTime<Utc>> {
        self.last_hit_at
    }

    /// When this entry was last useful; never-hit entries count from creation
    pub fn last_used_at(&self) -> DateTime<Utc> {
        self.last_hit_at.unwrap_or(self.created_at)
    }

    pub fn record_hit(&mut self, at: DateTime<Utc>) {
        self.hit_count += 1;
        self.last_hit_at = Some(at);
    }
}

/// A successful lookup, carrying the matched entry as it stood after the hit
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub entry: CacheEntry,
    pub similarity: f32,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(CacheHit),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_hit(self) -> Option<CacheHit> {
        match self {
            Self::Hit(hit) => Some(hit),
            Self::Miss => None,
        }
    }
}

/// Point-in-time view of the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub threshold: f32,
    pub embedding_dimension: usize,
    pub backing_store: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    /// Lookup outcomes since this process loaded the cache
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f32 / total as f32
    }
}
