//! Component wiring: configuration to a running pipeline.

use std::sync::Arc;
use tracing::{info, warn};

use lumen_cache::{CacheBackend, DisabledBackend, QueryCache, RedisBackend, RedisBackendConfig};
use lumen_core::AppConfig;
use lumen_engine::{PipelineBuilder, QueryPipeline};
use lumen_llm::{CostLedger, LlmClient, LlmGateway};
use lumen_store::PgQuestionStore;
use lumen_warehouse::{ClickHouseClient, ClickHouseConfig, DisabledWarehouse, WarehouseReader};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
}

/// Builds the pipeline from configuration. Optional collaborators that are
/// configured but unreachable degrade to their disabled forms; the server
/// still starts.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let ledger = Arc::new(CostLedger::new());
    let gateway: Arc<dyn LlmGateway> =
        Arc::new(LlmClient::new(config.llm.clone(), Arc::clone(&ledger))?);

    let backend: Arc<dyn CacheBackend> = match &config.cache.url {
        Some(url) => match RedisBackend::connect(RedisBackendConfig::new(url)).await {
            Ok(backend) => Arc::new(backend),
            Err(err) => {
                warn!("Cache unreachable, continuing without it: {}", err);
                Arc::new(DisabledBackend)
            }
        },
        None => Arc::new(DisabledBackend),
    };
    let cache = QueryCache::new(backend, config.cache.default_ttl());

    let warehouse: Arc<dyn WarehouseReader> = match &config.warehouse.url {
        Some(url) => Arc::new(ClickHouseClient::new(ClickHouseConfig::new(url))?),
        None => Arc::new(DisabledWarehouse),
    };

    let mut builder = PipelineBuilder::new(gateway, warehouse)
        .with_cache(cache)
        .with_ledger(ledger)
        .with_request_timeout(config.request_timeout());

    if let Some(url) = &config.metadata.url {
        match PgQuestionStore::connect(url).await {
            Ok(store) => {
                info!("Metadata store connected");
                builder = builder.with_store(Arc::new(store));
            }
            Err(err) => {
                warn!("Metadata store unreachable, questions stay in memory: {}", err);
            }
        }
    }

    Ok(AppState {
        pipeline: Arc::new(builder.build()),
    })
}
