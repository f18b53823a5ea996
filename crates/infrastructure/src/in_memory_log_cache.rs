use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use flowtrail_application::log_ports::LogCache;
use flowtrail_core::AppResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache adapter for development and tests.
#[derive(Default)]
pub struct InMemoryLogCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryLogCache {
    /// Creates an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogCache for InMemoryLogCache {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set_string(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            key.to_owned(),
            CacheEntry {
                value: value.to_owned(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flowtrail_application::log_ports::LogCache;

    use super::InMemoryLogCache;

    #[tokio::test]
    async fn round_trips_values_within_the_ttl() {
        let cache = InMemoryLogCache::new();
        cache
            .set_string("logs:all:page_1_20", "payload", 60)
            .await
            .unwrap_or_else(|_| unreachable!());

        let value = cache
            .get_string("logs:all:page_1_20")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(value.as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn zero_ttl_writes_are_dropped() {
        let cache = InMemoryLogCache::new();
        cache
            .set_string("logs:all:page_1_20", "payload", 0)
            .await
            .unwrap_or_else(|_| unreachable!());

        let value = cache
            .get_string("logs:all:page_1_20")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn removed_keys_are_gone() {
        let cache = InMemoryLogCache::new();
        cache
            .set_string("stats:all", "payload", 60)
            .await
            .unwrap_or_else(|_| unreachable!());
        cache
            .remove("stats:all")
            .await
            .unwrap_or_else(|_| unreachable!());

        let value = cache
            .get_string("stats:all")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(value.is_none());
    }
}
