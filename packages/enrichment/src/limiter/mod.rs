//! Durable, tenant-scoped rate limiting.
//!
//! The check and the increment are one atomic operation so concurrent
//! requests for the same tenant cannot overdraft the quota. Windows reset
//! lazily ("reset if stale, then increment") instead of via a background
//! timer, so counters survive process restarts untouched.
//!
//! The limiter's own backing-store failures FAIL OPEN: cost control is
//! secondary to availability for this internal dependency. The pipeline
//! logs that choice whenever it is exercised.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreResult;

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryRateLimiter;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRateLimiter;

/// Per-tenant quota configuration.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub per_minute: i64,
    pub per_day: i64,
    /// Prepaid balance seeded for new tenants
    pub initial_balance: i64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_minute: 10,
            per_day: 200,
            initial_balance: 10_000,
        }
    }
}

/// Outcome of one atomic check-and-increment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining_minute: i64,
    pub remaining_day: i64,
    pub balance: i64,
    /// Seconds until the minute window resets; meaningful when rejected
    pub retry_after_secs: i64,
}

/// Atomic check-and-increment against a durable counter store.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check quota for `tenant_id` and bill one attempt if allowed.
    ///
    /// A rejected attempt must not mutate any counter; balances never go
    /// negative.
    async fn check_and_increment(&self, tenant_id: Uuid) -> StoreResult<RateDecision>;
}
