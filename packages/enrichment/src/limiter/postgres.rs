//! Postgres-backed rate limiter.
//!
//! Atomicity comes from `SELECT ... FOR UPDATE` inside one transaction:
//! concurrent requests for the same tenant serialize on the row lock, so
//! the check and the increment are indivisible.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RateDecision, RateLimiter, RateLimits};
use crate::error::StoreResult;

/// Durable counter store; survives cold starts of the calling service.
pub struct PostgresRateLimiter {
    pool: PgPool,
    limits: RateLimits,
}

impl PostgresRateLimiter {
    pub fn new(pool: PgPool, limits: RateLimits) -> Self {
        Self { pool, limits }
    }
}

#[derive(sqlx::FromRow)]
struct CounterRow {
    minute_count: i64,
    day_count: i64,
    minute_reset: DateTime<Utc>,
    day_reset: DateTime<Utc>,
    balance: i64,
}

#[async_trait]
impl RateLimiter for PostgresRateLimiter {
    async fn check_and_increment(&self, tenant_id: Uuid) -> StoreResult<RateDecision> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Seed a row for first-time tenants, then lock it
        sqlx::query(
            r#"
            INSERT INTO tenant_rate_limits
                (tenant_id, minute_count, day_count, minute_reset, day_reset, balance)
            VALUES ($1, 0, 0, $2, $2, $3)
            ON CONFLICT (tenant_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .bind(self.limits.initial_balance)
        .execute(&mut *tx)
        .await?;

        let row: CounterRow = sqlx::query_as(
            r#"
            SELECT minute_count, day_count, minute_reset, day_reset, balance
            FROM tenant_rate_limits
            WHERE tenant_id = $1
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        // Lazy window reset
        let (mut minute_count, minute_reset) = if now - row.minute_reset >= Duration::minutes(1) {
            (0, now)
        } else {
            (row.minute_count, row.minute_reset)
        };
        let (mut day_count, day_reset) = if now - row.day_reset >= Duration::days(1) {
            (0, now)
        } else {
            (row.day_count, row.day_reset)
        };

        let allowed = row.balance > 0
            && minute_count < self.limits.per_minute
            && day_count < self.limits.per_day;

        // Retry-After tracks the constraint that rejected; balance
        // exhaustion has no scheduled reset so it borrows the day horizon.
        let minute_retry = (60 - (now - minute_reset).num_seconds()).clamp(1, 60);
        let day_retry = (86_400 - (now - day_reset).num_seconds()).clamp(1, 86_400);
        let retry_after_secs = if day_count >= self.limits.per_day || row.balance <= 0 {
            day_retry
        } else {
            minute_retry
        };

        let balance = if allowed {
            minute_count += 1;
            day_count += 1;

            sqlx::query(
                r#"
                UPDATE tenant_rate_limits
                SET minute_count = $2, day_count = $3,
                    minute_reset = $4, day_reset = $5,
                    balance = balance - 1
                WHERE tenant_id = $1
                "#,
            )
            .bind(tenant_id)
            .bind(minute_count)
            .bind(day_count)
            .bind(minute_reset)
            .bind(day_reset)
            .execute(&mut *tx)
            .await?;

            row.balance - 1
        } else {
            // Rejection never mutates counters or balance
            row.balance
        };

        tx.commit().await?;

        Ok(RateDecision {
            allowed,
            remaining_minute: (self.limits.per_minute - minute_count).max(0),
            remaining_day: (self.limits.per_day - day_count).max(0),
            balance,
            retry_after_secs,
        })
    }
}
