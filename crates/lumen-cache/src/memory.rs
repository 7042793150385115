//! In-memory cache backend.
//!
//! A fast local backend for development and tests, with per-entry TTL and
//! capacity-bounded eviction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::CacheBackend;
use crate::Result;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct MemoryBackendConfig {
    /// Maximum number of entries before eviction kicks in.
    pub max_entries: usize,
    /// Interval for the background sweep of expired entries; `None`
    /// disables the sweep (expired entries are still filtered on read).
    pub cleanup_interval: Option<Duration>,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            cleanup_interval: Some(Duration::from_secs(60)),
        }
    }
}

#[derive(Clone)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    config: MemoryBackendConfig,
}

impl MemoryBackend {
    pub fn new(config: MemoryBackendConfig) -> Self {
        let backend = Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        };

        if let Some(interval) = backend.config.cleanup_interval {
            let entries = Arc::clone(&backend.entries);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    let mut entries = entries.write().await;
                    let before = entries.len();
                    entries.retain(|_, v| !v.is_expired());
                    let removed = before - entries.len();
                    if removed > 0 {
                        debug!("Memory cache cleanup: removed {} expired entries", removed);
                    }
                }
            });
        }

        backend
    }

    /// Backend with the default configuration and no background sweep,
    /// suitable for tests.
    pub fn unswept() -> Self {
        Self::new(MemoryBackendConfig {
            cleanup_interval: None,
            ..Default::default()
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn evict_one(entries: &mut HashMap<String, Entry>) {
        let expired_key = entries
            .iter()
            .find(|(_, v)| v.is_expired())
            .map(|(k, _)| k.clone());

        if let Some(key) = expired_key {
            entries.remove(&key);
            return;
        }

        if let Some(key) = entries.keys().next().cloned() {
            entries.remove(&key);
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            Self::evict_one(&mut entries);
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|e| !e.is_expired()).unwrap_or(false))
    }
}
