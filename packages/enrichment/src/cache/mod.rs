//! Durable enrichment cache.
//!
//! Entries are keyed by (tenant, domain) and are never shared across
//! tenants. TTL is fixed at write time; an expired entry found on read is
//! deleted and reported as a miss rather than served stale. Fallback-quality
//! profiles are never written, so a low-confidence answer cannot be
//! cemented for the full TTL.
//!
//! Cache backing-store failures FAIL CLOSED to "miss" (the asymmetry with
//! the fail-open limiter is deliberate; see DESIGN.md).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::{EnrichedProfile, ProfileSource};

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryProfileCache;
#[cfg(feature = "postgres")]
pub use postgres::PostgresProfileCache;

/// Fixed entry lifetime, computed at write time.
pub const CACHE_TTL_HOURS: i64 = 24;

/// A cache hit with its remaining lifetime.
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub profile: EnrichedProfile,
    /// Provider that originally produced the entry
    pub provider: ProfileSource,
    pub remaining_ttl_secs: i64,
}

/// Get/set contract against the durable key-value store.
#[async_trait]
pub trait ProfileCache: Send + Sync {
    /// Look up a profile. Expired entries are deleted and reported as a
    /// miss. Hit accounting (hit count, last accessed) is best-effort.
    async fn get(&self, tenant_id: Uuid, domain: &str) -> StoreResult<Option<CacheLookup>>;

    /// Write a profile with the fixed TTL, replacing any existing entry.
    async fn set(
        &self,
        tenant_id: Uuid,
        domain: &str,
        profile: &EnrichedProfile,
        provider: ProfileSource,
    ) -> StoreResult<()>;

    /// Delete expired entries; returns how many were removed. Used by the
    /// periodic retention task.
    async fn purge_expired(&self) -> StoreResult<u64>;
}
