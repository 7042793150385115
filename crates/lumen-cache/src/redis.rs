//! Redis-backed cache implementation.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, info};

use crate::backend::CacheBackend;
use crate::Result;

#[derive(Debug, Clone)]
pub struct RedisBackendConfig {
    pub url: String,
    pub key_prefix: Option<String>,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            key_prefix: Some(String::from("lumen:")),
        }
    }
}

impl RedisBackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: Option<String>) -> Self {
        self.key_prefix = prefix;
        self
    }
}

#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
    config: RedisBackendConfig,
}

impl RedisBackend {
    pub async fn connect(config: RedisBackendConfig) -> Result<Self> {
        info!("Connecting to cache at {}", config.url);

        let client = Client::open(config.url.clone())?;
        let connection = ConnectionManager::new(client).await?;

        info!("Cache connection established");

        Ok(Self { connection, config })
    }

    fn make_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.make_key(key);
        debug!("Getting cache key: {}", full_key);

        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(&full_key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let full_key = self.make_key(key);
        debug!("Setting cache key: {} with TTL: {:?}", full_key, ttl);

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(&full_key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.make_key(key);
        debug!("Deleting cache key: {}", full_key);

        let mut conn = self.connection.clone();
        let _: () = conn.del(&full_key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_key = self.make_key(key);

        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(&full_key).await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_keeps_prefix() {
        let config = RedisBackendConfig::new("redis://localhost:6379")
            .with_key_prefix(Some("test:".to_string()));

        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.key_prefix, Some("test:".to_string()));
    }

    #[test]
    fn default_prefix_is_applied() {
        let config = RedisBackendConfig::default();
        assert_eq!(config.key_prefix.as_deref(), Some("lumen:"));
    }
}
