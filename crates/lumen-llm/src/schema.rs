//! Declared response schemas for structured LLM output.
//!
//! Serde handles the shape (unknown enum values fail deserialization);
//! `validate` handles the range and cardinality rules. Validation is the
//! single source of truth: a response that deserializes but fails
//! validation is treated exactly like malformed JSON.

use serde::{Deserialize, Serialize};

use lumen_core::{ChartKind, DataSourceTag, Insight, InsightCategory, IntentKind};

use crate::error::{LlmError, Result};

/// Structured answer to an intent-classification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResponse {
    pub intent: IntentKind,
    pub confidence: f64,
    pub categories: Vec<String>,
    pub data_sources: Vec<DataSourceTag>,
    pub suggested_visualizations: Vec<ChartKind>,
}

impl IntentResponse {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(LlmError::schema(format!(
                "intent confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.categories.is_empty() {
            return Err(LlmError::schema("intent categories must be non-empty"));
        }
        if self.data_sources.is_empty() {
            return Err(LlmError::schema("intent data_sources must be non-empty"));
        }
        if self.suggested_visualizations.is_empty() {
            return Err(LlmError::schema(
                "intent suggested_visualizations must be non-empty",
            ));
        }
        Ok(())
    }
}

/// One insight as returned by the model, prior to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightPayload {
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
    pub confidence_score: f64,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub data_evidence: Vec<String>,
}

impl InsightPayload {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LlmError::schema("insight title must be non-empty"));
        }
        if self.title.len() > Insight::MAX_TITLE_LEN {
            return Err(LlmError::schema(format!(
                "insight title exceeds {} characters",
                Insight::MAX_TITLE_LEN
            )));
        }
        if self.description.trim().is_empty() {
            return Err(LlmError::schema("insight description must be non-empty"));
        }
        if self.description.len() > Insight::MAX_DESCRIPTION_LEN {
            return Err(LlmError::schema(format!(
                "insight description exceeds {} characters",
                Insight::MAX_DESCRIPTION_LEN
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(LlmError::schema(format!(
                "insight confidence {} outside [0, 1]",
                self.confidence_score
            )));
        }
        if self.action_items.len() > Insight::MAX_ACTION_ITEMS {
            return Err(LlmError::schema("insight has too many action items"));
        }
        if self.data_evidence.len() > Insight::MAX_EVIDENCE {
            return Err(LlmError::schema("insight has too many evidence entries"));
        }
        Ok(())
    }
}

/// Wrapper for the list of generated insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub insights: Vec<InsightPayload>,
}

impl InsightsResponse {
    pub const MIN_INSIGHTS: usize = 2;
    pub const MAX_INSIGHTS: usize = 3;

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_INSIGHTS..=Self::MAX_INSIGHTS).contains(&self.insights.len()) {
            return Err(LlmError::schema(format!(
                "insight list must contain {}..={} entries, got {}",
                Self::MIN_INSIGHTS,
                Self::MAX_INSIGHTS,
                self.insights.len()
            )));
        }
        for insight in &self.insights {
            insight.validate()?;
        }
        Ok(())
    }
}
