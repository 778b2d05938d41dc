//! Short-lived key/value storage with per-entry expiry.
//!
//! Reset tokens live only here. The Redis store is shared by every instance of
//! the service; the in-memory store is for single-process deployments and tests.

mod memory_store;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

pub use self::memory_store::MemoryTokenStore;
pub use self::redis_store::RedisTokenStore;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry, for `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;

    /// `None` when the key was never set, was deleted, or has expired.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Evict expired entries. Stores with native expiry have nothing to do.
    fn purge_expired(&self) -> usize {
        0
    }
}
