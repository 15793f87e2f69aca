//! End-to-end pipeline behavior against in-memory stores and scripted
//! providers.

use std::sync::Arc;

use uuid::Uuid;

use enrichment::cache::MemoryProfileCache;
use enrichment::error::{EnrichmentError, ProviderError};
use enrichment::limiter::{MemoryRateLimiter, RateLimits};
use enrichment::pipeline::Enricher;
use enrichment::testing::{MockBehavior, MockProvider};
use enrichment::types::{EnrichmentRequest, ProfileSource};
use enrichment::RawProfile;

fn tenant() -> Uuid {
    Uuid::new_v4()
}

fn enricher_with(
    cache: Arc<MemoryProfileCache>,
    limiter: Arc<MemoryRateLimiter>,
    providers: Vec<Arc<MockProvider>>,
) -> Enricher {
    let mut enricher = Enricher::new(limiter, cache);
    for p in providers {
        enricher = enricher.with_provider(p);
    }
    enricher
}

#[tokio::test]
async fn primary_success_is_scored_and_cached() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );
    let secondary = MockProvider::new("web-search", ProfileSource::Secondary, MockBehavior::Empty);

    let enricher = enricher_with(
        cache.clone(),
        limiter,
        vec![primary.clone(), secondary.clone()],
    );
    let tenant = tenant();
    let outcome = enricher
        .enrich(&EnrichmentRequest::new(tenant, "https://acme.io"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(!outcome.is_fallback);
    assert!(!outcome.cached);
    assert_eq!(outcome.provider, ProfileSource::Primary);
    assert!(outcome.profile.confidence > 0.9);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(secondary.call_count(), 0);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn second_call_is_served_from_cache() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(cache.clone(), limiter, vec![primary.clone()]);
    let tenant = tenant();
    let request = EnrichmentRequest::new(tenant, "https://www.acme.io/about?utm=x");

    enricher.enrich(&request).await.unwrap();
    let outcome = enricher.enrich(&request).await.unwrap();

    assert!(outcome.cached);
    assert_eq!(outcome.provider, ProfileSource::Cache);
    assert_eq!(outcome.profile.source, ProfileSource::Cache);
    // Only the first call reached the provider
    assert_eq!(primary.call_count(), 1);
    assert_eq!(cache.hit_count(tenant, "acme.io"), Some(1));
}

#[tokio::test]
async fn force_refresh_bypasses_cache_and_rewrites_it() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(cache.clone(), limiter, vec![primary.clone()]);
    let tenant = tenant();

    enricher
        .enrich(&EnrichmentRequest::new(tenant, "acme.io"))
        .await
        .unwrap();
    let outcome = enricher
        .enrich(&EnrichmentRequest::new(tenant, "acme.io").with_force_refresh(true))
        .await
        .unwrap();

    assert!(!outcome.cached);
    assert_eq!(outcome.provider, ProfileSource::Primary);
    assert_eq!(primary.call_count(), 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn chain_falls_through_to_secondary() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Fail(ProviderError::Timeout { attempts: 3 }),
    );
    let secondary = MockProvider::new(
        "web-search",
        ProfileSource::Secondary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(
        cache.clone(),
        limiter,
        vec![primary.clone(), secondary.clone()],
    );
    let outcome = enricher
        .enrich(&EnrichmentRequest::new(tenant(), "acme.io"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.provider, ProfileSource::Secondary);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(secondary.call_count(), 1);
    assert!(outcome.warnings.iter().any(|w| w.starts_with("ai-search")));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn placeholder_quality_results_are_skipped() {
    let placeholder = RawProfile {
        description: Some("No information available; visit the company's website.".into()),
        ..Default::default()
    };
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(placeholder)),
    );
    let secondary = MockProvider::new(
        "web-search",
        ProfileSource::Secondary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(
        cache.clone(),
        limiter,
        vec![primary.clone(), secondary.clone()],
    );
    let outcome = enricher
        .enrich(&EnrichmentRequest::new(tenant(), "acme.io"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.provider, ProfileSource::Secondary);
    assert_eq!(secondary.call_count(), 1);
}

#[tokio::test]
async fn terminal_fallback_when_all_providers_fail() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Fail(ProviderError::Transport("connection refused".into())),
    );
    let secondary = MockProvider::new("web-search", ProfileSource::Secondary, MockBehavior::Empty);

    let enricher = enricher_with(cache.clone(), limiter, vec![primary, secondary]);
    let outcome = enricher
        .enrich(&EnrichmentRequest::new(tenant(), "acme.io"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(outcome.is_fallback);
    assert_eq!(outcome.provider, ProfileSource::Fallback);
    assert_eq!(outcome.profile.confidence, 0.0);
    assert!(outcome.profile.ai_generated);
    // Fallback results are never cached
    assert!(cache.is_empty());
}

#[tokio::test]
async fn rate_limited_requests_never_reach_providers() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits {
        per_minute: 1,
        per_day: 100,
        initial_balance: 100,
    }));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(cache, limiter, vec![primary.clone()]);
    let tenant = tenant();

    enricher
        .enrich(&EnrichmentRequest::new(tenant, "acme.io"))
        .await
        .unwrap();
    // Different domain to dodge the cache; the quota is per tenant
    let err = enricher
        .enrich(&EnrichmentRequest::new(tenant, "globex.com"))
        .await
        .unwrap_err();

    match err {
        EnrichmentError::RateLimited(decision) => {
            assert!(!decision.allowed);
            assert_eq!(decision.remaining_minute, 0);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn invalid_urls_are_rejected_before_any_spend() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(cache, limiter.clone(), vec![primary.clone()]);
    let tenant = tenant();

    for bad in ["http://169.254.169.254/latest", "localhost", "not a url"] {
        let err = enricher
            .enrich(&EnrichmentRequest::new(tenant, bad))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Validation(_)));
    }

    assert_eq!(primary.call_count(), 0);
    // No quota was charged either
    assert_eq!(limiter.balance(tenant), None);
}

#[tokio::test]
async fn cache_opt_out_skips_reads_and_writes() {
    let cache = Arc::new(MemoryProfileCache::new());
    let limiter = Arc::new(MemoryRateLimiter::new(RateLimits::default()));
    let primary = MockProvider::new(
        "ai-search",
        ProfileSource::Primary,
        MockBehavior::Profile(Box::new(MockProvider::complete_profile())),
    );

    let enricher = enricher_with(cache.clone(), limiter, vec![primary.clone()]);
    let request = EnrichmentRequest::new(tenant(), "acme.io").with_cache(false);

    enricher.enrich(&request).await.unwrap();
    enricher.enrich(&request).await.unwrap();

    assert_eq!(primary.call_count(), 2);
    assert!(cache.is_empty());
}
