//! # Lumen Cache
//!
//! Keyed get/set over an external KV store with TTL namespacing and
//! process-wide statistics.
//!
//! The cache is a performance optimization, never a correctness dependency:
//! every backend failure degrades to a miss (reads) or a silent no-op
//! (writes), and a missing `CACHE_URL` swaps in a backend that never stores
//! anything at all.

pub mod backend;
pub mod client;
pub mod memory;
pub mod redis;
pub mod stats;

pub use backend::{CacheBackend, DisabledBackend};
pub use client::{Namespace, QueryCache};
pub use memory::{MemoryBackend, MemoryBackendConfig};
pub use self::redis::{RedisBackend, RedisBackendConfig};
pub use stats::{CacheStats, CacheStatsSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] ::redis::RedisError),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache operation timed out")]
    Timeout,
}

impl From<CacheError> for lumen_core::AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Timeout => lumen_core::AppError::timeout(err.to_string()),
            other => lumen_core::AppError::cache_unavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
