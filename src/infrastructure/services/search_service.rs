//! Search pipeline: cache lookup, routing, retrieval and cache insert

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::embedding_gateway::EmbeddingGateway;
use super::retrieval_service::RetrievalOrchestrator;
use super::router_service::RouterService;
use super::semantic_cache_service::SemanticCacheService;
use crate::domain::{
    CacheLookup, CacheMetrics, DomainError, NoopReporter, ProgressReporter, RetrievalOutcome,
    RouteCategory, SearchQuery, SearchResponse, SourceRef,
};
use crate::infrastructure::observability::record_query;

const COMPONENT: &str = "SearchPipeline";

/// Cache insert deferred until the caller knows the query was not cancelled
#[derive(Debug, Clone)]
pub struct PendingInsert {
    question: String,
    embedding: Vec<f32>,
    answer: String,
    sources: Vec<SourceRef>,
    category: RouteCategory,
}

#[derive(Debug)]
pub struct Resolved {
    pub response: SearchResponse,
    pub pending: Option<PendingInsert>,
}

#[derive(Debug)]
pub struct SearchService {
    cache: Arc<SemanticCacheService>,
    embeddings: Arc<EmbeddingGateway>,
    router: Arc<RouterService>,
    orchestrator: Arc<RetrievalOrchestrator>,
}

impl SearchService {
    pub fn new(
        cache: Arc<SemanticCacheService>,
        embeddings: Arc<EmbeddingGateway>,
        router: Arc<RouterService>,
        orchestrator: Arc<RetrievalOrchestrator>,
    ) -> Self {
        Self {
            cache,
            embeddings,
            router,
            orchestrator,
        }
    }

    pub fn cache(&self) -> &Arc<SemanticCacheService> {
        &self.cache
    }

    /// Cancelled once the pipeline hits a fault the process cannot serve through
    pub fn shutdown_token(&self) -> CancellationToken {
        self.embeddings.shutdown_token()
    }

    /// Answer `query` without touching the cache contents.
    ///
    /// On a miss the response carries the insert to run once the caller
    /// decides the answer should be kept.
    pub async fn resolve(
        &self,
        query_id: &str,
        query: &SearchQuery,
        reporter: &dyn ProgressReporter,
    ) -> Result<Resolved, DomainError> {
        let started = Instant::now();
        let result = self.resolve_inner(query_id, query, reporter, started).await;

        let outcome = match &result {
            Ok(resolved) if resolved.response.cache_metrics.hit => "hit",
            Ok(_) => "answered",
            Err(_) => "failed",
        };
        record_query(outcome, started.elapsed());

        result
    }

    async fn resolve_inner(
        &self,
        query_id: &str,
        query: &SearchQuery,
        reporter: &dyn ProgressReporter,
        started: Instant,
    ) -> Result<Resolved, DomainError> {
        let text = query.text();
        let options = query.options();

        reporter.info("EmbeddingGateway", "Embedding question");
        let embedding = self.embeddings.embed(text).await?;

        let lookup_started = Instant::now();
        let lookup = self.cache.lookup(&embedding)?;
        let lookup_ms = lookup_started.elapsed().as_millis() as u64;

        if let CacheLookup::Hit(hit) = lookup {
            reporter.info(
                "SemanticCache",
                &format!("Cache HIT (similarity: {:.3})", hit.similarity),
            );
            info!(
                query_id = %query_id,
                entry_id = %hit.entry.id(),
                similarity = hit.similarity,
                "Answered from cache"
            );

            let response = SearchResponse {
                query_id: query_id.to_string(),
                answer: hit.entry.answer_text().to_string(),
                sources: hit.entry.sources().to_vec(),
                query_type: hit.entry.category(),
                cache_metrics: CacheMetrics {
                    hit: true,
                    similarity_score: Some(hit.similarity),
                    cache_size: self.cache.len(),
                    lookup_ms,
                },
                degraded: false,
                escalated: false,
                sub_queries: Vec::new(),
                processing_time_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            };

            return Ok(Resolved {
                response,
                pending: None,
            });
        }

        reporter.info("SemanticCache", "Cache MISS");

        let outcome: RetrievalOutcome = if options.sub_query {
            self.orchestrator
                .answer_with_sub_queries(text, &embedding, options, reporter)
                .await?
        } else {
            reporter.info("QueryRouter", "Classifying question");
            let decision = self.router.classify(text).await;
            reporter.info(
                "QueryRouter",
                &format!(
                    "Routed to {} ({})",
                    decision.category,
                    decision.source.as_str()
                ),
            );
            self.orchestrator
                .retrieve_and_answer(text, &embedding, &decision, options, reporter)
                .await?
        };

        info!(
            query_id = %query_id,
            category = %outcome.category,
            degraded = outcome.degraded,
            escalated = outcome.escalated,
            sources = outcome.sources.len(),
            "Query answered"
        );

        let pending = outcome.is_cacheable().then(|| PendingInsert {
            question: text.to_string(),
            embedding,
            answer: outcome.answer.clone(),
            sources: outcome.sources.clone(),
            category: outcome.category,
        });

        if pending.is_none() {
            reporter.info(COMPONENT, "Answer is degraded or partial; not caching it");
        }

        let response = SearchResponse {
            query_id: query_id.to_string(),
            answer: outcome.answer,
            sources: outcome.sources,
            query_type: outcome.category,
            cache_metrics: CacheMetrics {
                hit: false,
                similarity_score: None,
                cache_size: self.cache.len(),
                lookup_ms,
            },
            degraded: outcome.degraded,
            escalated: outcome.escalated,
            sub_queries: outcome.sub_queries,
            processing_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };

        Ok(Resolved { response, pending })
    }

    /// Store a resolved answer in the cache
    pub async fn commit(&self, pending: PendingInsert) -> Result<(), DomainError> {
        self.cache
            .insert(
                &pending.question,
                &pending.embedding,
                &pending.answer,
                pending.sources,
                pending.category,
            )
            .await
            .map(|_| ())
    }

    /// [`Self::commit`] for cancellable callers: `Ok(false)` when the write was skipped
    pub async fn commit_unless_cancelled(
        &self,
        pending: PendingInsert,
        cancel: &CancellationToken,
    ) -> Result<bool, DomainError> {
        if cancel.is_cancelled() {
            return Ok(false);
        }

        self.cache
            .insert_unless_cancelled(
                &pending.question,
                &pending.embedding,
                &pending.answer,
                pending.sources,
                pending.category,
                cancel,
            )
            .await
            .map(|entry| entry.is_some())
    }

    /// Resolve and commit in one step; a degraded cache write only logs.
    /// Used by callers that cannot cancel.
    pub async fn search(
        &self,
        query: &SearchQuery,
        reporter: &dyn ProgressReporter,
    ) -> Result<SearchResponse, DomainError> {
        let query_id = Uuid::new_v4().to_string();
        let Resolved {
            mut response,
            pending,
        } = self.resolve(&query_id, query, reporter).await?;

        if let Some(pending) = pending {
            match self.commit(pending).await {
                Ok(()) => response.cache_metrics.cache_size = self.cache.len(),
                Err(e) => warn!(query_id = %query_id, error = %e, "Answer not persisted"),
            }
        }

        Ok(response)
    }

    /// [`Self::search`] without progress output
    pub async fn search_quiet(&self, query: &SearchQuery) -> Result<SearchResponse, DomainError> {
        self.search(query, &NoopReporter).await
    }
}
