//! Expiring key/value cache used by the order read path.
//!
//! Values are JSON strings stored under keys such as `order:{id}`. Every
//! write carries a time-to-live; a read after expiry is a miss.

pub mod error;
pub mod memory;
pub mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

pub use error::{CacheError, Result};
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;

/// Key/value cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the live value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value, for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// JSON helpers on top of [`Cache`].
#[async_trait]
pub trait CacheExt: Cache {
    /// Reads and decodes a JSON value.
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Encodes and stores a JSON value.
    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.set(key, &text, ttl).await
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
