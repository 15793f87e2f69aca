//! In-memory rate limiter for testing and credential-less development.
//!
//! Atomicity comes from a single mutex over the counter table, which is
//! the same guarantee the Postgres implementation gets from row locking.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{RateDecision, RateLimiter, RateLimits};
use crate::error::StoreResult;

#[derive(Debug, Clone)]
struct Counter {
    minute_count: i64,
    day_count: i64,
    minute_reset: DateTime<Utc>,
    day_reset: DateTime<Utc>,
    balance: i64,
}

/// Mutex-guarded counter map. Not durable; use the Postgres limiter in
/// production.
pub struct MemoryRateLimiter {
    limits: RateLimits,
    counters: Mutex<HashMap<Uuid, Counter>>,
}

impl MemoryRateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Current balance for a tenant, for assertions in tests.
    pub fn balance(&self, tenant_id: Uuid) -> Option<i64> {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.get(&tenant_id).map(|c| c.balance)
    }
}

impl Default for MemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check_and_increment(&self, tenant_id: Uuid) -> StoreResult<RateDecision> {
        let now = Utc::now();
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());

        let counter = counters.entry(tenant_id).or_insert_with(|| Counter {
            minute_count: 0,
            day_count: 0,
            minute_reset: now,
            day_reset: now,
            balance: self.limits.initial_balance,
        });

        // Lazy window reset
        if now - counter.minute_reset >= Duration::minutes(1) {
            counter.minute_count = 0;
            counter.minute_reset = now;
        }
        if now - counter.day_reset >= Duration::days(1) {
            counter.day_count = 0;
            counter.day_reset = now;
        }

        let allowed = counter.balance > 0
            && counter.minute_count < self.limits.per_minute
            && counter.day_count < self.limits.per_day;

        // Retry-After tracks the constraint that rejected. An empty balance
        // has no scheduled reset, so it advertises the day horizon as the
        // longest wait this store can state.
        let minute_retry = (60 - (now - counter.minute_reset).num_seconds()).clamp(1, 60);
        let day_retry = (86_400 - (now - counter.day_reset).num_seconds()).clamp(1, 86_400);
        let retry_after_secs =
            if counter.day_count >= self.limits.per_day || counter.balance <= 0 {
                day_retry
            } else {
                minute_retry
            };

        if allowed {
            counter.minute_count += 1;
            counter.day_count += 1;
            counter.balance -= 1;
        }

        Ok(RateDecision {
            allowed,
            remaining_minute: (self.limits.per_minute - counter.minute_count).max(0),
            remaining_day: (self.limits.per_day - counter.day_count).max(0),
            balance: counter.balance,
            retry_after_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limits(per_minute: i64) -> RateLimits {
        RateLimits {
            per_minute,
            per_day: 1_000,
            initial_balance: 1_000,
        }
    }

    #[tokio::test]
    async fn allows_until_minute_limit() {
        let limiter = MemoryRateLimiter::new(limits(3));
        let tenant = Uuid::new_v4();

        for i in 0..3 {
            let decision = limiter.check_and_increment(tenant).await.unwrap();
            assert!(decision.allowed, "call {} should be allowed", i);
        }
        let decision = limiter.check_and_increment(tenant).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining_minute, 0);
        assert!(decision.retry_after_secs >= 1);
        assert!(decision.retry_after_secs <= 60);
    }

    #[tokio::test]
    async fn day_limit_rejection_advertises_day_horizon() {
        let limiter = MemoryRateLimiter::new(RateLimits {
            per_minute: 100,
            per_day: 1,
            initial_balance: 1_000,
        });
        let tenant = Uuid::new_v4();

        assert!(limiter.check_and_increment(tenant).await.unwrap().allowed);
        let decision = limiter.check_and_increment(tenant).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining_day, 0);
        // The minute window is not the binding constraint here
        assert!(decision.retry_after_secs > 60);
        assert!(decision.retry_after_secs <= 86_400);
    }

    #[tokio::test]
    async fn rejection_does_not_bill_balance() {
        let limiter = MemoryRateLimiter::new(limits(1));
        let tenant = Uuid::new_v4();

        limiter.check_and_increment(tenant).await.unwrap();
        let before = limiter.balance(tenant).unwrap();
        limiter.check_and_increment(tenant).await.unwrap();
        assert_eq!(limiter.balance(tenant).unwrap(), before);
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let limiter = MemoryRateLimiter::new(limits(1));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(limiter.check_and_increment(a).await.unwrap().allowed);
        assert!(!limiter.check_and_increment(a).await.unwrap().allowed);
        assert!(limiter.check_and_increment(b).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn concurrent_calls_admit_exactly_the_limit() {
        let n = 20i64;
        let limiter = Arc::new(MemoryRateLimiter::new(limits(n)));
        let tenant = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..(2 * n) {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.check_and_increment(tenant).await.unwrap().allowed
            }));
        }

        let mut allowed = 0;
        let mut rejected = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            } else {
                rejected += 1;
            }
        }

        assert_eq!(allowed, n);
        assert_eq!(rejected, n);
        assert!(limiter.balance(tenant).unwrap() >= 0);
    }

    #[tokio::test]
    async fn exhausted_balance_rejects() {
        let limiter = MemoryRateLimiter::new(RateLimits {
            per_minute: 100,
            per_day: 100,
            initial_balance: 2,
        });
        let tenant = Uuid::new_v4();

        assert!(limiter.check_and_increment(tenant).await.unwrap().allowed);
        assert!(limiter.check_and_increment(tenant).await.unwrap().allowed);
        let decision = limiter.check_and_increment(tenant).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.balance, 0);
        assert!(decision.retry_after_secs > 60);
    }
}
