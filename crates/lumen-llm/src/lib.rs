//! # Lumen LLM
//!
//! The single outbound channel to the LLM provider.
//!
//! Every request is paced to a minimum inter-request interval, accounted in
//! the process-wide [`CostLedger`], and validated against a declared
//! response schema. Callers treat any error from this crate as a signal to
//! take their deterministic fallback path; nothing here panics or retries
//! indefinitely.

pub mod client;
pub mod error;
pub mod ledger;
pub mod pacing;
pub mod schema;

use async_trait::async_trait;

pub use client::LlmClient;
pub use error::{LlmError, Result};
pub use ledger::{CostLedger, CostSummary};
pub use pacing::RequestPacer;
pub use schema::{InsightPayload, InsightsResponse, IntentResponse};

/// Gateway to the LLM provider.
///
/// Both operations may block on the rate-limit window before issuing the
/// request. An `Err` means the caller must fall back deterministically; the
/// gateway never fabricates content on its own.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Classifies a question into a structured intent.
    async fn classify_intent(&self, question: &str) -> Result<IntentResponse>;

    /// Generates grounded insights for a question and its context summary.
    async fn generate_insights(
        &self,
        question: &str,
        context_summary: &str,
    ) -> Result<Vec<InsightPayload>>;
}
