//! Redis-backed log cache.

use async_trait::async_trait;
use redis::AsyncCommands;

use flowtrail_application::log_ports::LogCache;
use flowtrail_core::{AppError, AppResult};

/// Redis implementation of the log cache port.
///
/// Values are stored as plain strings under a key prefix; expiry is left to
/// Redis TTLs.
#[derive(Clone)]
pub struct RedisLogCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisLogCache {
    /// Creates a cache with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl LogCache for RedisLogCache {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        connection
            .get(self.key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to read cache key: {error}")))
    }

    async fn set_string(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let mut connection = self.connection().await?;
        connection
            .set_ex::<_, _, ()>(self.key_for(key), value, u64::from(ttl_seconds))
            .await
            .map_err(|error| AppError::Internal(format!("failed to write cache key: {error}")))
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection
            .del::<_, ()>(self.key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to remove cache key: {error}")))
    }
}
