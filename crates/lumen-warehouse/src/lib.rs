//! # Lumen Warehouse
//!
//! Read-only access to the columnar analytical store over its HTTP
//! interface: typed readers for the sales, inventory, and customer tables,
//! derived business metrics, and parameterized reads of the pre-aggregated
//! views.
//!
//! The adapter never surfaces transport failures to callers: a call that
//! still fails after one retry returns an empty result set and logs. Input
//! bounds (`days`, `limit`) are validated the same way; an out-of-range
//! request yields an empty result plus a warning, never an error.

pub mod aggregate;
pub mod client;
pub mod reader;

use async_trait::async_trait;

pub use aggregate::AggregateSpec;
pub use client::{ClickHouseClient, ClickHouseConfig};
pub use reader::DisabledWarehouse;

use lumen_core::{BusinessMetrics, CustomerRecord, DynamicContext, InventoryRecord, SalesRecord};

/// Valid range for the `days` parameter of [`WarehouseReader::sales`].
pub const DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=365;
/// Valid range for the `limit` parameter of [`WarehouseReader::customers`].
pub const LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("warehouse transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("warehouse row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("warehouse returned status {0}: {1}")]
    Status(u16, String),
}

impl From<WarehouseError> for lumen_core::AppError {
    fn from(err: WarehouseError) -> Self {
        match &err {
            WarehouseError::Http(http) if http.is_timeout() => {
                lumen_core::AppError::timeout(err.to_string())
            }
            _ => lumen_core::AppError::warehouse_unavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;

/// Read-only view over the analytical store.
///
/// Every operation absorbs backend failures per the adapter policy, so the
/// signatures are infallible; an empty result can mean "no data" or
/// "store unreachable", and the distinction lives in the logs.
#[async_trait]
pub trait WarehouseReader: Send + Sync {
    /// Last `days` days of per-transaction sales records.
    async fn sales(&self, days: u32) -> Vec<SalesRecord>;

    /// Current per-(store, product) stock positions.
    async fn inventory(&self) -> Vec<InventoryRecord>;

    /// Up to `limit` customer profiles.
    async fn customers(&self, limit: u32) -> Vec<CustomerRecord>;

    /// Derived key business metrics.
    async fn metrics(&self) -> BusinessMetrics;

    /// Parameterized read of a pre-aggregated view.
    async fn run_aggregate(&self, spec: &AggregateSpec) -> DynamicContext;
}
