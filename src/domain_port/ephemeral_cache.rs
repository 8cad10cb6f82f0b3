use super::StoreError;
use std::time::Duration;

/// Volatile key/value store with absolute per-entry expiry. Values are
/// opaque strings; callers encode structured values as JSON.
#[async_trait::async_trait]
pub trait EphemeralCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Store every entry under one shared expiry.
    async fn set_many(&self, entries: &[(String, String)], ttl: Duration)
    -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically add one to the counter under `key` (absent or expired counts
    /// as 0), reset its expiry to `ttl`, and return the new value.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, StoreError>;
}
