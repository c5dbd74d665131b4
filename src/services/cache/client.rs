//! Cache client interface used by the auth-context cache and its invalidation.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command/serialization).
///
/// Kept independent from `AppError`: the auth-context cache fails open, so
/// these are logged and never reach the client.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache value error: {0}")]
    InvalidValue(String),
}

/// A small, string-based key-value + set interface.
///
/// Not-found is `Ok(None)` / empty, never an error. Shared as
/// `Arc<dyn CacheClient>`, so the trait stays object safe.
#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Unconditional set with TTL (`SET key value EX ttl`).
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    // Add a member to a set. Returns number of members newly added.
    async fn set_add(&self, key: &str, member: &str) -> CacheResult<u64>;

    // Set a TTL on an existing key. Returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    // All members of a set; empty when the key does not exist.
    async fn set_members(&self, key: &str) -> CacheResult<Vec<String>>;

    // Delete all keys in one command. Returns number of deleted keys.
    async fn del_many(&self, keys: &[String]) -> CacheResult<u64>;
}

/// Redis `EX` takes whole seconds; clamp to at least 1.
pub fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
