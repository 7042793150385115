//! # Lumen Core
//!
//! Shared domain model for the lumen natural-language BI service.
//!
//! This crate defines the entities that flow through the query-to-insight
//! pipeline (questions, intents, insights, visualizations, data contexts),
//! the application-wide error model, text normalization and fingerprinting,
//! and environment-backed configuration.

pub mod config;
pub mod context;
pub mod error;
pub mod text;
pub mod types;

pub use config::{
    AppConfig, CacheConfig, LlmConfig, MetadataConfig, ServerConfig, WarehouseConfig,
};
pub use context::{
    BusinessMetrics, CustomerContext, CustomerRecord, DataContext, DynamicContext,
    InventoryContext, InventoryRecord, RevenueRank, SalesContext, SalesRecord,
};
pub use error::{AppError, AppResult, ErrorKind};
pub use text::{fingerprint, normalize};
pub use types::{
    ChartKind, DataSourceTag, Insight, InsightCategory, Intent, IntentKind, Question,
    ResponseEnvelope, Visualization, MAX_QUESTION_LEN, MAX_USER_TAG_LEN, MIN_QUESTION_LEN,
};
