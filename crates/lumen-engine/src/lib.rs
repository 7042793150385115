//! # Lumen Engine
//!
//! The query-to-insight pipeline: given a natural-language business
//! question, choose and fetch grounding data, generate validated insights
//! and recommendations, build chart specifications, and wrap the whole
//! thing in a cached, persisted response envelope.
//!
//! The orchestrator in [`pipeline`] sequences the stages and owns the
//! partial-failure policy: for any valid input it returns a successful
//! envelope, degrading stage by stage when collaborators are unavailable.

pub mod context;
pub mod insights;
pub mod pipeline;
pub mod summary;
pub mod viz;

pub use context::ContextRetriever;
pub use insights::{fallback_insight, recommendations, InsightGenerator};
pub use pipeline::{PipelineBuilder, QueryPipeline};
pub use summary::format_summary;
pub use viz::build_visualizations;
