//! Typed errors for the enrichment library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

use crate::limiter::RateDecision;

/// Errors that can occur during an enrichment request.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// URL validation failed (never retried)
    #[error("validation failed: {0}")]
    Validation(#[from] SecurityError),

    /// Tenant quota exhausted; carries the limiter decision for Retry-After
    #[error("rate limit exceeded for tenant")]
    RateLimited(RateDecision),

    /// No provider adapters configured
    #[error("no enrichment providers configured")]
    NoProviders,
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Input was empty or whitespace
    #[error("empty URL")]
    Empty,

    /// Input exceeded the maximum accepted length
    #[error("URL too long: {0} chars")]
    TooLong(usize),

    /// Input does not look like a domain at all
    #[error("not a valid domain: {0}")]
    NotADomain(String),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// Host is blocked (e.g., localhost, metadata services)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL carries embedded credentials
    #[error("embedded credentials not allowed")]
    EmbeddedCredentials,

    /// Only the default HTTPS port is allowed
    #[error("disallowed port: {0}")]
    DisallowedPort(u16),
}

/// Errors surfaced by a provider adapter after the resilient call wrapper
/// has exhausted its budget.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Breaker is open; no network attempt was made
    #[error("circuit open for provider {provider}")]
    CircuitOpen { provider: String },

    /// Hard timeout, including retries
    #[error("timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// Transient upstream failure (429/5xx) that outlived the retry budget
    #[error("transient upstream failure (status {status:?}) after {attempts} attempt(s): {message}")]
    Transient {
        status: Option<u16>,
        attempts: u32,
        message: String,
    },

    /// Permanent upstream failure (4xx other than 429), never retried
    #[error("permanent upstream failure (status {status}): {message}")]
    Permanent { status: u16, message: String },

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from the durable backing stores (rate limiter, cache).
///
/// These never fail a request: the limiter fails open and the cache fails
/// to a miss. See the pipeline for where that policy is applied.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing database unavailable or query failed
    #[error("store error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Stored payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(Box::new(e))
    }
}

/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichmentError>;

/// Result type alias for security checks.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
