use thiserror::Error;

/// Errors that can occur using the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache unavailable")]
    Unavailable,
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
