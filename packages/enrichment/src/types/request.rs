//! Request and outcome types for the orchestrator.

use serde::Serialize;
use uuid::Uuid;

use super::profile::{EnrichedProfile, ProfileSource};

/// A single enrichment request, created and destroyed per call.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub tenant_id: Uuid,
    pub url: String,
    pub use_cache: bool,
    pub force_refresh: bool,
}

impl EnrichmentRequest {
    pub fn new(tenant_id: Uuid, url: impl Into<String>) -> Self {
        Self {
            tenant_id,
            url: url.into(),
            use_cache: true,
            force_refresh: false,
        }
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

/// The completed result of an enrichment attempt.
///
/// A terminal fallback is still an outcome (not an error) so callers can
/// branch on data quality instead of catching exceptions; `success` is
/// false and `is_fallback` is true in that case.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentOutcome {
    pub success: bool,
    pub profile: EnrichedProfile,
    pub provider: ProfileSource,
    pub cached: bool,
    pub duration_ms: u64,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
