//! Cache-stats command - load the cache store and print its statistics

use crate::api::types::CacheStatsResponse;
use crate::domain::SemanticCacheConfig;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    println!("{}", render(&config.cache).await?);
    Ok(())
}

/// Same fail-fast loading rules as `serve`
async fn render(config: &SemanticCacheConfig) -> anyhow::Result<String> {
    let cache = crate::load_semantic_cache(config).await?;
    let stats = CacheStatsResponse::from(cache.stats());

    Ok(serde_json::to_string_pretty(&stats)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CacheEntry, CacheSnapshot, CacheStore, RouteCategory};
    use crate::infrastructure::semantic_cache::JsonFileCacheStore;

    #[tokio::test]
    async fn test_stats_of_persisted_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let entry = CacheEntry::new(
            "What was Uber's revenue in 2021?",
            vec![1.0, 0.0, 0.0, 0.0],
            "$17.455 billion",
            vec![],
            RouteCategory::DocumentQuery,
        );
        JsonFileCacheStore::new(&path)
            .save(&CacheSnapshot::new(4, vec![entry]))
            .await
            .unwrap();

        let config = SemanticCacheConfig::default()
            .with_file_path(path.to_string_lossy())
            .with_embedding_dimension(4);
        let json: serde_json::Value = serde_json::from_str(&render(&config).await.unwrap()).unwrap();

        assert_eq!(json["entry_count"], 1);
        assert_eq!(json["embedding_dimension"], 4);
        assert_eq!(json["hit_rate"], 0.0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        JsonFileCacheStore::new(&path)
            .save(&CacheSnapshot::new(4, vec![]))
            .await
            .unwrap();

        let config = SemanticCacheConfig::default()
            .with_file_path(path.to_string_lossy())
            .with_embedding_dimension(8);

        assert!(render(&config).await.is_err());
    }
}
