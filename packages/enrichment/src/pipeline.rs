//! The enrichment orchestrator.
//!
//! Composes validation, cache, rate limiting, the provider fallback chain
//! and scoring into the end-to-end request flow. Steps within a request
//! are strictly sequential; the only shared state is the breaker registry
//! and the external stores behind the trait objects.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Utc};

use crate::breaker::BreakerRegistry;
use crate::cache::ProfileCache;
use crate::error::{EnrichmentError, Result};
use crate::limiter::RateLimiter;
use crate::normalize::{fallback_profile, is_fallback_quality, normalize};
use crate::providers::EnrichmentProvider;
use crate::scrub::mask_domain;
use crate::types::{EnrichmentOutcome, EnrichmentRequest, ProfileSource};
use crate::validator::validate_company_url;

/// Request-scoped enrichment pipeline.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct Enricher {
    limiter: Arc<dyn RateLimiter>,
    cache: Arc<dyn ProfileCache>,
    providers: Vec<Arc<dyn EnrichmentProvider>>,
    breakers: Arc<BreakerRegistry>,
    scrub_logs: bool,
}

impl Enricher {
    pub fn new(limiter: Arc<dyn RateLimiter>, cache: Arc<dyn ProfileCache>) -> Self {
        Self {
            limiter,
            cache,
            providers: Vec::new(),
            breakers: Arc::new(BreakerRegistry::default()),
            scrub_logs: false,
        }
    }

    /// Append a provider to the fallback chain; order is priority order.
    pub fn with_provider(mut self, provider: Arc<dyn EnrichmentProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_breakers(mut self, breakers: Arc<BreakerRegistry>) -> Self {
        self.breakers = breakers;
        self
    }

    /// Mask domains/URLs in log output (production mode).
    pub fn with_scrub_logs(mut self, scrub_logs: bool) -> Self {
        self.scrub_logs = scrub_logs;
        self
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    fn loggable(&self, domain: &str) -> String {
        if self.scrub_logs {
            mask_domain(domain)
        } else {
            domain.to_string()
        }
    }

    /// Run the full pipeline for one request.
    ///
    /// Rate-limit rejection is the only quota error surfaced to the
    /// caller; provider exhaustion produces a terminal-fallback outcome,
    /// not an error.
    pub async fn enrich(&self, request: &EnrichmentRequest) -> Result<EnrichmentOutcome> {
        let started = Instant::now();

        // SSRF validation gates everything: no cache read, no quota
        // charge, no network call on an unvalidated input.
        let identity = validate_company_url(&request.url)?;

        if self.providers.is_empty() {
            return Err(EnrichmentError::NoProviders);
        }

        let domain_log = self.loggable(&identity.domain);
        tracing::info!(
            tenant_id = %request.tenant_id,
            domain = %domain_log,
            force_refresh = request.force_refresh,
            "enrichment request"
        );

        if request.use_cache && !request.force_refresh {
            match self.cache.get(request.tenant_id, &identity.domain).await {
                Ok(Some(hit)) => {
                    tracing::info!(
                        tenant_id = %request.tenant_id,
                        domain = %domain_log,
                        remaining_ttl_secs = hit.remaining_ttl_secs,
                        "cache hit"
                    );
                    let mut profile = hit.profile;
                    profile.source = ProfileSource::Cache;
                    return Ok(EnrichmentOutcome {
                        success: true,
                        profile,
                        provider: ProfileSource::Cache,
                        cached: true,
                        duration_ms: started.elapsed().as_millis() as u64,
                        is_fallback: false,
                        warnings: Vec::new(),
                    });
                }
                Ok(None) => {}
                // Cache store failure fails closed to "miss"
                Err(e) => {
                    tracing::warn!(error = %e, "cache lookup failed, treating as miss");
                }
            }
        }

        match self.limiter.check_and_increment(request.tenant_id).await {
            Ok(decision) if !decision.allowed => {
                tracing::info!(
                    tenant_id = %request.tenant_id,
                    remaining_minute = decision.remaining_minute,
                    remaining_day = decision.remaining_day,
                    "rate limit exceeded"
                );
                return Err(EnrichmentError::RateLimited(decision));
            }
            Ok(_) => {}
            // Limiter store failure fails OPEN: availability over cost
            // control for this internal dependency. Must be visible in logs.
            Err(e) => {
                tracing::warn!(error = %e, "rate limiter unavailable, failing open");
            }
        }

        let mut warnings: Vec<String> = Vec::new();
        let current_year = Utc::now().year();

        for provider in &self.providers {
            if self.breakers.is_open(provider.name()) {
                tracing::debug!(provider = provider.name(), "skipping provider: breaker open");
                warnings.push(format!("{}: skipped, circuit open", provider.name()));
                continue;
            }

            match provider.try_enrich(&identity).await {
                Ok(Some(raw)) => {
                    let (profile, mut field_warnings) =
                        normalize(raw, provider.source(), current_year);

                    if is_fallback_quality(&profile) {
                        tracing::info!(
                            provider = provider.name(),
                            domain = %domain_log,
                            "provider returned fallback-quality content, continuing chain"
                        );
                        warnings.push(format!(
                            "{}: returned placeholder-quality content",
                            provider.name()
                        ));
                        continue;
                    }

                    warnings.append(&mut field_warnings);

                    if request.use_cache {
                        if let Err(e) = self
                            .cache
                            .set(request.tenant_id, &identity.domain, &profile, profile.source)
                            .await
                        {
                            tracing::warn!(error = %e, "cache write failed");
                            warnings.push("result could not be cached".to_string());
                        }
                    }

                    tracing::info!(
                        provider = provider.name(),
                        domain = %domain_log,
                        confidence = profile.confidence,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "enrichment succeeded"
                    );

                    return Ok(EnrichmentOutcome {
                        success: true,
                        provider: profile.source,
                        cached: false,
                        duration_ms: started.elapsed().as_millis() as u64,
                        is_fallback: false,
                        warnings,
                        profile,
                    });
                }
                Ok(None) => {
                    tracing::info!(
                        provider = provider.name(),
                        domain = %domain_log,
                        "provider returned no usable data"
                    );
                    warnings.push(format!("{}: no usable data", provider.name()));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        domain = %domain_log,
                        error = %e,
                        "provider failed"
                    );
                    warnings.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        // Terminal fallback: a successful response at the protocol level,
        // flagged so callers can branch on data quality. Never cached.
        warnings.push("no provider returned usable data".to_string());
        tracing::info!(
            tenant_id = %request.tenant_id,
            domain = %domain_log,
            duration_ms = started.elapsed().as_millis() as u64,
            "returning terminal fallback"
        );

        Ok(EnrichmentOutcome {
            success: false,
            profile: fallback_profile(),
            provider: ProfileSource::Fallback,
            cached: false,
            duration_ms: started.elapsed().as_millis() as u64,
            is_fallback: true,
            warnings,
        })
    }
}
