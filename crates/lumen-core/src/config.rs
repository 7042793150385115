//! Environment-backed application configuration.
//!
//! Every knob is an environment variable with a default, loaded through the
//! `config` crate. Empty strings count as absent for the optional endpoint
//! keys: a missing `CACHE_URL` disables caching, a missing `LLM_API_KEY`
//! forces the deterministic fallback path, and so on.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Flat view of the environment, matching the variable names exactly.
#[derive(Debug, Clone, Deserialize)]
struct RawEnv {
    llm_api_key: String,
    llm_model: String,
    llm_base_url: String,
    llm_cost_per_1k_tokens: f64,
    llm_min_interval_ms: u64,
    cache_url: String,
    cache_default_ttl_s: u64,
    warehouse_url: String,
    metadata_db_url: String,
    request_timeout_s: u64,
    host: String,
    port: u16,
}

/// LLM gateway configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Absent (or empty) key disables the gateway entirely.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub cost_per_1k_tokens: f64,
    pub min_interval_ms: u64,
}

impl LlmConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Cache adapter configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Absent endpoint disables the cache (every lookup is a miss).
    pub url: Option<String>,
    pub default_ttl_s: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_s)
    }
}

/// Analytical-store configuration.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Absent endpoint forces empty data contexts.
    pub url: Option<String>,
}

/// Metadata-store configuration.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Absent endpoint forces in-memory questions.
    pub url: Option<String>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub warehouse: WarehouseConfig,
    pub metadata: MetadataConfig,
    pub server: ServerConfig,
    pub request_timeout_s: u64,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(Environment::default().try_parsing(true))
            .set_default("llm_api_key", "")?
            .set_default("llm_model", "gpt-4o-mini")?
            .set_default("llm_base_url", "https://api.openai.com/v1")?
            .set_default("llm_cost_per_1k_tokens", 0.002)?
            .set_default("llm_min_interval_ms", 100)?
            .set_default("cache_url", "")?
            .set_default("cache_default_ttl_s", 3600)?
            .set_default("warehouse_url", "")?
            .set_default("metadata_db_url", "")?
            .set_default("request_timeout_s", 60)?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?;

        let raw: RawEnv = builder.build()?.try_deserialize()?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawEnv) -> Self {
        Self {
            llm: LlmConfig {
                api_key: non_empty(raw.llm_api_key),
                model: raw.llm_model,
                base_url: raw.llm_base_url,
                cost_per_1k_tokens: raw.llm_cost_per_1k_tokens,
                min_interval_ms: raw.llm_min_interval_ms,
            },
            cache: CacheConfig {
                url: non_empty(raw.cache_url),
                default_ttl_s: raw.cache_default_ttl_s,
            },
            warehouse: WarehouseConfig {
                url: non_empty(raw.warehouse_url),
            },
            metadata: MetadataConfig {
                url: non_empty(raw.metadata_db_url),
            },
            server: ServerConfig {
                host: raw.host,
                port: raw.port,
            },
            request_timeout_s: raw.request_timeout_s,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
