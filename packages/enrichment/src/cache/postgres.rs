//! Postgres-backed enrichment cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CacheLookup, ProfileCache, CACHE_TTL_HOURS};
use crate::error::StoreResult;
use crate::types::{EnrichedProfile, ProfileSource};

/// Durable cache in the `enrichment_cache` table.
pub struct PostgresProfileCache {
    pool: PgPool,
}

impl PostgresProfileCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CacheRow {
    profile: serde_json::Value,
    provider: String,
    expires_at: DateTime<Utc>,
}

fn provider_from_str(s: &str) -> ProfileSource {
    match s {
        "primary" => ProfileSource::Primary,
        "secondary" => ProfileSource::Secondary,
        "cache" => ProfileSource::Cache,
        _ => ProfileSource::Fallback,
    }
}

#[async_trait]
impl ProfileCache for PostgresProfileCache {
    async fn get(&self, tenant_id: Uuid, domain: &str) -> StoreResult<Option<CacheLookup>> {
        let now = Utc::now();

        let row: Option<CacheRow> = sqlx::query_as(
            r#"
            SELECT profile, provider, expires_at
            FROM enrichment_cache
            WHERE tenant_id = $1 AND domain = $2
            "#,
        )
        .bind(tenant_id)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if row.expires_at <= now {
            // Expired: delete rather than serve stale
            sqlx::query("DELETE FROM enrichment_cache WHERE tenant_id = $1 AND domain = $2")
                .bind(tenant_id)
                .bind(domain)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        // Hit accounting is best-effort; a failure here must not fail the read
        if let Err(e) = sqlx::query(
            r#"
            UPDATE enrichment_cache
            SET hit_count = hit_count + 1, last_accessed = $3
            WHERE tenant_id = $1 AND domain = $2
            "#,
        )
        .bind(tenant_id)
        .bind(domain)
        .bind(now)
        .execute(&self.pool)
        .await
        {
            tracing::warn!(error = %e, "cache hit accounting failed");
        }

        let profile: EnrichedProfile = serde_json::from_value(row.profile)?;

        Ok(Some(CacheLookup {
            profile,
            provider: provider_from_str(&row.provider),
            remaining_ttl_secs: (row.expires_at - now).num_seconds(),
        }))
    }

    async fn set(
        &self,
        tenant_id: Uuid,
        domain: &str,
        profile: &EnrichedProfile,
        provider: ProfileSource,
    ) -> StoreResult<()> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(CACHE_TTL_HOURS);
        let payload = serde_json::to_value(profile)?;

        sqlx::query(
            r#"
            INSERT INTO enrichment_cache
                (tenant_id, domain, profile, provider, fetched_at, expires_at, hit_count, last_accessed)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $5)
            ON CONFLICT (tenant_id, domain) DO UPDATE
            SET profile = EXCLUDED.profile,
                provider = EXCLUDED.provider,
                fetched_at = EXCLUDED.fetched_at,
                expires_at = EXCLUDED.expires_at,
                hit_count = 0,
                last_accessed = EXCLUDED.last_accessed
            "#,
        )
        .bind(tenant_id)
        .bind(domain)
        .bind(payload)
        .bind(provider.as_str())
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM enrichment_cache WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires DATABASE_URL with migrations applied
    async fn set_get_round_trip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.expect("connect to test db");
        let cache = PostgresProfileCache::new(pool);
        let tenant = Uuid::new_v4();

        let profile = EnrichedProfile {
            description: Some("Acme makes rockets.".into()),
            confidence: 0.25,
            ..EnrichedProfile::empty(ProfileSource::Primary, true)
        };

        cache
            .set(tenant, "acme.io", &profile, ProfileSource::Primary)
            .await
            .unwrap();

        let hit = cache.get(tenant, "acme.io").await.unwrap().unwrap();
        assert_eq!(hit.profile, profile);
        assert_eq!(hit.provider, ProfileSource::Primary);
    }
}
