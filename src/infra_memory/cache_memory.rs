use crate::domain_port::*;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local ephemeral cache. Expiry is judged against the injected
/// clock on every read; `purge_expired` reclaims memory for keys nobody reads
/// again.
pub struct InMemoryCache {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        InMemoryCache {
            entries: DashMap::new(),
            clock,
        }
    }

    fn deadline(&self, now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, StoreError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| anyhow!(e))?;
        now.checked_add_signed(ttl)
            .ok_or_else(|| StoreError::InternalError(anyhow!("ttl out of range")))
    }

    /// Drop every expired entry and return how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl EphemeralCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = self.deadline(self.clock.now(), ttl)?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn set_many(
        &self,
        entries: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = self.deadline(self.clock.now(), ttl)?;
        for (key, value) in entries {
            self.entries.insert(
                key.clone(),
                CacheEntry {
                    value: value.clone(),
                    expires_at,
                },
            );
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError> {
        let now = self.clock.now();
        let expires_at = self.deadline(now, ttl)?;

        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry {
                value: "0".to_string(),
                expires_at: now,
            });

        let current = if entry.expires_at > now {
            entry
                .value
                .parse::<u64>()
                .map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?
        } else {
            0
        };
        let next = current.saturating_add(1);
        entry.value = next.to_string();
        entry.expires_at = expires_at;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn cache() -> (Arc<ManualClock>, InMemoryCache) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = InMemoryCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn entries_expire_with_the_clock() {
        let (clock, cache) = cache();
        cache
            .set("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        clock.advance(ChronoDuration::seconds(9));
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        clock.advance(ChronoDuration::seconds(1));
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn increment_counts_and_refreshes_ttl() {
        let (clock, cache) = cache();
        let ttl = Duration::from_secs(60);

        assert_eq!(cache.increment("c", ttl).await.unwrap(), 1);
        clock.advance(ChronoDuration::seconds(45));
        assert_eq!(cache.increment("c", ttl).await.unwrap(), 2);

        // Refreshed by the second increment, so still alive 45s later.
        clock.advance(ChronoDuration::seconds(45));
        assert_eq!(cache.get("c").await.unwrap().as_deref(), Some("2"));

        // Expired counters restart from zero.
        clock.advance(ChronoDuration::seconds(61));
        assert_eq!(cache.increment("c", ttl).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn increment_rejects_non_numeric_values() {
        let (_clock, cache) = cache();
        cache
            .set("c", "abc", Duration::from_secs(60))
            .await
            .unwrap();
        let err = cache
            .increment("c", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(InMemoryCache::new(clock));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .increment("hot", Duration::from_secs(60))
                    .await
                    .unwrap()
            }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=32).collect::<Vec<u64>>());
        assert_eq!(cache.get("hot").await.unwrap().as_deref(), Some("32"));
    }

    #[tokio::test]
    async fn purge_drops_only_expired_entries() {
        let (clock, cache) = cache();
        cache.set("short", "1", Duration::from_secs(5)).await.unwrap();
        cache.set("long", "2", Duration::from_secs(50)).await.unwrap();

        clock.advance(ChronoDuration::seconds(10));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn set_many_shares_one_expiry() {
        let (clock, cache) = cache();
        cache
            .set_many(
                &[
                    ("a".to_string(), "1".to_string()),
                    ("b".to_string(), "2".to_string()),
                ],
                Duration::from_secs(30),
            )
            .await
            .unwrap();

        let a = cache.entries.get("a").unwrap().expires_at;
        let b = cache.entries.get("b").unwrap().expires_at;
        assert_eq!(a, b);

        clock.advance(ChronoDuration::seconds(29));
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(cache.get("b").await.unwrap().as_deref(), Some("2"));

        clock.advance(ChronoDuration::seconds(1));
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_clock, cache) = cache();
        cache.set("k", "v", Duration::from_secs(5)).await.unwrap();
        cache.remove("k").await.unwrap();
        cache.remove("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
