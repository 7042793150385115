//! Typed, namespaced cache client.
//!
//! Wraps a [`CacheBackend`] with JSON serialization, per-namespace TTLs, a
//! short operation timeout, and failure absorption: a backend that errors
//! or stalls degrades to a miss (reads) or a silent no-op (writes), with
//! the failure counted in [`CacheStats`].

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{CacheBackend, DisabledBackend};
use crate::stats::{CacheStats, CacheStatsSnapshot};

/// Cache key namespaces with their fixed TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Full response envelopes, keyed by question fingerprint.
    Query,
    /// Intent classifications, keyed by question fingerprint.
    Intent,
    /// Generated insight lists, keyed by question fingerprint.
    Insights,
    /// Warehouse data snapshots, keyed by endpoint and parameter hash.
    Data,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Query => "query",
            Namespace::Intent => "intent",
            Namespace::Insights => "insights",
            Namespace::Data => "data",
        }
    }

    /// Namespace TTL; `None` falls back to the configured default.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Namespace::Query => Some(Duration::from_secs(1800)),
            Namespace::Intent => Some(Duration::from_secs(7200)),
            Namespace::Insights => Some(Duration::from_secs(7200)),
            Namespace::Data => Some(Duration::from_secs(900)),
        }
    }
}

/// Timeout applied to each backend round trip.
const OP_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct QueryCache {
    backend: Arc<dyn CacheBackend>,
    stats: Arc<CacheStats>,
    default_ttl: Duration,
}

impl QueryCache {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend,
            stats: Arc::new(CacheStats::new()),
            default_ttl,
        }
    }

    /// Cache with no backing store: every read misses, every write is a
    /// successful no-op.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledBackend), Duration::from_secs(3600))
    }

    fn key(ns: Namespace, id: &str) -> String {
        format!("{}:{}", ns.prefix(), id)
    }

    fn ttl_for(&self, ns: Namespace) -> Duration {
        ns.ttl().unwrap_or(self.default_ttl)
    }

    /// Looks up and deserializes a cached value. Backend failures,
    /// timeouts, and decode failures all read as misses.
    pub async fn get<T: DeserializeOwned>(&self, ns: Namespace, id: &str) -> Option<T> {
        let key = Self::key(ns, id);
        let raw = match tokio::time::timeout(OP_TIMEOUT, self.backend.get(&key)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(key = %key, "Cache get failed: {}", err);
                self.stats.record_error();
                return None;
            }
            Err(_) => {
                warn!(key = %key, "Cache get timed out");
                self.stats.record_error();
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(key = %key, "Cache miss");
            self.stats.record_miss();
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                self.stats.record_hit();
                Some(value)
            }
            Err(err) => {
                warn!(key = %key, "Cache entry failed to decode: {}", err);
                self.stats.record_error();
                None
            }
        }
    }

    /// Serializes and stores a value under the namespace TTL. Returns
    /// whether the write was accepted; failures are silent.
    pub async fn set<T: Serialize>(&self, ns: Namespace, id: &str, value: &T) -> bool {
        let ttl = self.ttl_for(ns);
        self.set_with_ttl(ns, id, value, ttl).await
    }

    pub async fn set_with_ttl<T: Serialize>(
        &self,
        ns: Namespace,
        id: &str,
        value: &T,
        ttl: Duration,
    ) -> bool {
        let key = Self::key(ns, id);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %key, "Cache value failed to encode: {}", err);
                self.stats.record_error();
                return false;
            }
        };

        match tokio::time::timeout(OP_TIMEOUT, self.backend.set(&key, &raw, ttl)).await {
            Ok(Ok(())) => {
                self.stats.record_set();
                true
            }
            Ok(Err(err)) => {
                warn!(key = %key, "Cache set failed: {}", err);
                self.stats.record_error();
                false
            }
            Err(_) => {
                warn!(key = %key, "Cache set timed out");
                self.stats.record_error();
                false
            }
        }
    }

    pub async fn delete(&self, ns: Namespace, id: &str) -> bool {
        let key = Self::key(ns, id);
        match tokio::time::timeout(OP_TIMEOUT, self.backend.delete(&key)).await {
            Ok(Ok(())) => {
                self.stats.record_delete();
                true
            }
            Ok(Err(err)) => {
                warn!(key = %key, "Cache delete failed: {}", err);
                self.stats.record_error();
                false
            }
            Err(_) => {
                self.stats.record_error();
                false
            }
        }
    }

    pub async fn exists(&self, ns: Namespace, id: &str) -> bool {
        let key = Self::key(ns, id);
        match tokio::time::timeout(OP_TIMEOUT, self.backend.exists(&key)).await {
            Ok(Ok(exists)) => exists,
            _ => {
                self.stats.record_error();
                false
            }
        }
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
