//! Semantic Search Gateway
//!
//! Answers natural-language questions through a pipeline of:
//! - A semantic cache keyed by question embeddings
//! - A query router choosing filings, API docs or the live web
//! - Retrieval-augmented answering with optional sub-question decomposition
//! - Per-connection WebSocket sessions streaming progress events

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use api::state::AppState;
use domain::{CacheStore, DocumentIndex, SemanticCacheConfig, WebSearchProvider};
use infrastructure::{
    embedding::OpenAiEmbeddingProvider,
    http_client::HttpClient,
    llm::OpenAiProvider,
    retrieval::{AresWebSearch, QdrantDocumentIndex},
    semantic_cache::{InMemoryCacheStore, JsonFileCacheStore},
    services::{
        CompletionGateway, EmbeddingGateway, RetrievalOrchestrator, RouterService, SearchService,
        SemanticCacheService,
    },
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Backing store for the cache; an empty path keeps it in memory only
pub fn create_cache_store(config: &SemanticCacheConfig) -> Arc<dyn CacheStore> {
    if config.file_path.trim().is_empty() {
        warn!("No cache file configured; cached answers will not survive a restart");
        Arc::new(InMemoryCacheStore::new())
    } else {
        Arc::new(JsonFileCacheStore::new(&config.file_path))
    }
}

/// Load the cache or fail: a corrupt or mismatched snapshot stops startup
pub async fn load_semantic_cache(
    config: &SemanticCacheConfig,
) -> anyhow::Result<Arc<SemanticCacheService>> {
    let store = create_cache_store(config);
    let cache = SemanticCacheService::load(config.clone(), store)
        .await
        .context("Failed to load semantic cache")?;

    Ok(Arc::new(cache))
}

/// Wire every collaborator and service from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let providers = &config.providers;
    let client = HttpClient::with_connect_timeout(CONNECT_TIMEOUT)?;

    let openai_key = providers.openai.api_key.clone().unwrap_or_else(|| {
        warn!("OPENAI_API_KEY is not set; model and embedding calls will fail");
        String::new()
    });

    let llm = Arc::new(OpenAiProvider::with_base_url(
        client.clone(),
        openai_key.clone(),
        &providers.openai.base_url,
    ));
    let embedder = Arc::new(OpenAiEmbeddingProvider::with_base_url(
        client.clone(),
        openai_key,
        &providers.openai.base_url,
    ));

    let index: Arc<dyn DocumentIndex> = Arc::new(QdrantDocumentIndex::new(
        client.clone(),
        &providers.qdrant.url,
        providers.qdrant.api_key.clone(),
    ));

    let ares_key = providers.ares.api_key.clone().unwrap_or_else(|| {
        warn!("ARES_API_KEY is not set; web search will fail");
        String::new()
    });
    let web: Arc<dyn WebSearchProvider> =
        Arc::new(AresWebSearch::with_url(client, ares_key, &providers.ares.url));

    let timeouts = &config.timeouts;
    let shutdown = CancellationToken::new();
    let embeddings = Arc::new(
        EmbeddingGateway::new(
            embedder,
            &providers.openai.embedding_model,
            config.cache.embedding_dimension,
            timeouts.embedding(),
        )
        .with_shutdown_token(shutdown),
    );
    embeddings
        .verify_dimension()
        .await
        .context("Embedding model does not produce the configured dimension")?;

    let cache = load_semantic_cache(&config.cache).await?;

    let completion = Arc::new(CompletionGateway::new(llm, timeouts.generation()));
    let router = Arc::new(
        RouterService::new(completion.clone(), config.router.clone())
            .context("Invalid router configuration")?,
    );
    let orchestrator = Arc::new(RetrievalOrchestrator::new(
        router.clone(),
        embeddings.clone(),
        completion,
        index.clone(),
        web,
        config.retrieval.clone(),
        timeouts.clone(),
    ));

    let search = Arc::new(SearchService::new(cache, embeddings, router, orchestrator));

    info!(
        qdrant = %providers.qdrant.url,
        embedding_model = %providers.openai.embedding_model,
        dimension = config.cache.embedding_dimension,
        "Application state initialized"
    );

    Ok(AppState::new(search, index))
}
