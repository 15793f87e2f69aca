//! Company enrichment pipeline.
//!
//! Takes a company website URL and produces a structured profile by
//! chaining external data providers behind a durable cache, per-tenant
//! rate limits and per-provider circuit breakers. The pipeline always
//! answers: when every provider fails it degrades to an explicit
//! zero-confidence fallback profile instead of an error.
//!
//! Postgres-backed stores live behind the `postgres` feature; the
//! in-memory implementations are always available and are what the
//! test suite uses.

pub mod breaker;
pub mod cache;
pub mod error;
pub mod limiter;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod retry;
pub mod scrub;
pub mod testing;
pub mod types;
pub mod validator;

pub use breaker::{BreakerConfig, BreakerRegistry};
pub use cache::{CacheLookup, ProfileCache, CACHE_TTL_HOURS};
pub use error::{EnrichmentError, ProviderError, Result, SecurityError, StoreError};
pub use limiter::{RateDecision, RateLimiter, RateLimits};
pub use pipeline::Enricher;
pub use providers::{
    AiSearchProvider, CompletionClient, EnrichmentProvider, RawProfile, SearchClient,
    StructuredExtractor, WebSearchProvider,
};
pub use retry::{resilient_call, CallError, CallFailure, RetryPolicy};
pub use types::{
    CompanyIdentity, EnrichedProfile, EnrichmentOutcome, EnrichmentRequest, ProfileSource,
    SocialLinks,
};
pub use validator::validate_company_url;
