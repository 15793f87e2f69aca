//! In-memory cache implementation for testing and development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{CacheLookup, ProfileCache, CACHE_TTL_HOURS};
use crate::error::StoreResult;
use crate::types::{EnrichedProfile, ProfileSource};

#[derive(Debug, Clone)]
struct Entry {
    profile: EnrichedProfile,
    provider: ProfileSource,
    expires_at: DateTime<Utc>,
    hit_count: u64,
}

/// Mutex-guarded cache map. Data is lost on restart; use the Postgres
/// cache in production.
#[derive(Default)]
pub struct MemoryProfileCache {
    entries: Mutex<HashMap<(Uuid, String), Entry>>,
    ttl_override: Option<Duration>,
}

impl MemoryProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorten the TTL, for expiry tests.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_override: Some(ttl),
        }
    }

    fn ttl(&self) -> Duration {
        self.ttl_override
            .unwrap_or_else(|| Duration::hours(CACHE_TTL_HOURS))
    }

    /// Number of live entries, for assertions in tests.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit count for an entry, for assertions in tests.
    pub fn hit_count(&self, tenant_id: Uuid, domain: &str) -> Option<u64> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(tenant_id, domain.to_string()))
            .map(|e| e.hit_count)
    }
}

#[async_trait]
impl ProfileCache for MemoryProfileCache {
    async fn get(&self, tenant_id: Uuid, domain: &str) -> StoreResult<Option<CacheLookup>> {
        let now = Utc::now();
        let key = (tenant_id, domain.to_string());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(&key) {
            Some(entry) if entry.expires_at > now => {
                entry.hit_count += 1;
                Ok(Some(CacheLookup {
                    profile: entry.profile.clone(),
                    provider: entry.provider,
                    remaining_ttl_secs: (entry.expires_at - now).num_seconds(),
                }))
            }
            Some(_) => {
                // Expired: delete rather than serve stale
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        tenant_id: Uuid,
        domain: &str,
        profile: &EnrichedProfile,
        provider: ProfileSource,
    ) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            (tenant_id, domain.to_string()),
            Entry {
                profile: profile.clone(),
                provider,
                expires_at: Utc::now() + self.ttl(),
                hit_count: 0,
            },
        );
        Ok(())
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}
