//! Cache backend abstraction.

use async_trait::async_trait;
use std::time::Duration;

use crate::Result;

/// Object-safe key-value backend. Payloads are serialized strings; the
/// typed layer lives in [`crate::client::QueryCache`].
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Backend used when no cache endpoint is configured: stores nothing,
/// reports every key as absent, and never fails.
#[derive(Debug, Clone, Default)]
pub struct DisabledBackend;

#[async_trait]
impl CacheBackend for DisabledBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_backend_is_always_a_miss() {
        let backend = DisabledBackend;
        backend
            .set("query:abc", "{}", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("query:abc").await.unwrap(), None);
        assert!(!backend.exists("query:abc").await.unwrap());
    }
}
