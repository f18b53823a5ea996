use async_trait::async_trait;
use flowtrail_core::AppResult;

/// Cache port for log pages and statistics.
///
/// The backing store offers plain key-value semantics only: no pattern
/// matching, no key scans. Invalidation works by deleting an enumerated set
/// of known keys, so every method takes fully-formed keys.
#[async_trait]
pub trait LogCache: Send + Sync {
    /// Returns the cached string for one key.
    async fn get_string(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a string under one key with a ttl.
    async fn set_string(&self, key: &str, value: &str, ttl_seconds: u32) -> AppResult<()>;

    /// Removes one key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> AppResult<()>;
}
