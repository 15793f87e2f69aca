//! Dependency wiring: turns configuration into a ready pipeline.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use enrichment::cache::{PostgresProfileCache, ProfileCache};
use enrichment::limiter::PostgresRateLimiter;
use enrichment::providers::{
    AiSearchProvider, CompletionClient, SearchClient, StructuredExtractor, WebSearchProvider,
};
use enrichment::retry::RetryPolicy;
use enrichment::{BreakerRegistry, Enricher};

use crate::config::Config;

/// How often the retention task deletes expired cache rows.
const RETENTION_INTERVAL_SECS: u64 = 3600;

/// Build the enrichment pipeline from configuration.
///
/// Providers with missing API keys are skipped with a warning; the server
/// still starts and serves 503 for enrichment until at least one provider
/// is configured.
pub fn build_enricher(config: &Config, pool: PgPool) -> Arc<Enricher> {
    let breakers = Arc::new(BreakerRegistry::default());
    let policy = RetryPolicy::default();

    let extractor = config.extraction_api_key.as_ref().map(|key| {
        StructuredExtractor::new(CompletionClient::new(
            key,
            &config.extraction_base_url,
            &config.extraction_model,
        ))
    });

    let limiter = Arc::new(PostgresRateLimiter::new(
        pool.clone(),
        config.rate_limits.clone(),
    ));
    let cache = Arc::new(PostgresProfileCache::new(pool));

    let mut enricher = Enricher::new(limiter, cache)
        .with_breakers(breakers.clone())
        .with_scrub_logs(config.scrub_logs);

    match (&config.ai_search_api_key, &extractor) {
        (Some(key), Some(extractor)) => {
            let research =
                CompletionClient::new(key, &config.ai_search_base_url, &config.ai_search_model);
            enricher = enricher.with_provider(Arc::new(AiSearchProvider::new(
                research,
                extractor.clone(),
                breakers.clone(),
                policy.clone(),
            )));
        }
        (Some(_), None) => {
            tracing::warn!("AI_SEARCH_API_KEY set but no extraction key; primary provider disabled")
        }
        (None, _) => tracing::warn!("AI_SEARCH_API_KEY not set; primary provider disabled"),
    }

    match &config.search_api_key {
        Some(key) => {
            let search = SearchClient::new(key, &config.search_base_url);
            enricher = enricher.with_provider(Arc::new(WebSearchProvider::new(
                search,
                extractor.clone(),
                breakers,
                policy,
            )));
        }
        None => tracing::warn!("SEARCH_API_KEY not set; secondary provider disabled"),
    }

    Arc::new(enricher)
}

/// Spawn the hourly retention task that purges expired cache rows.
pub fn spawn_retention_task(cache: Arc<dyn ProfileCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RETENTION_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match cache.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(purged = n, "expired cache entries removed"),
                Err(e) => tracing::warn!(error = %e, "cache retention pass failed"),
            }
        }
    });
}
