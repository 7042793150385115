//! Insight generation and recommendation derivation.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{instrument, warn};

use lumen_core::{DataContext, Insight, InsightCategory};
use lumen_llm::{InsightPayload, LlmGateway};

/// Upper bound on insights attached to one question.
pub const MAX_INSIGHTS: usize = 3;

/// Confidence ceiling applied to degraded results (fallback insights and
/// insights generated over an empty context).
pub const DEGRADED_CONFIDENCE: f64 = 0.6;

const DEFAULT_RECOMMENDATIONS: [&str; 2] = [
    "Monitor trend continuation",
    "Consider implementing suggested actions",
];

/// Generates grounded insights through the LLM gateway.
pub struct InsightGenerator {
    gateway: Arc<dyn LlmGateway>,
}

impl InsightGenerator {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Produces 1..=3 insights for a question. Gateway failures degrade to
    /// the single deterministic fallback insight.
    #[instrument(skip(self, summary, context), fields(question_len = question.len()))]
    pub async fn generate(
        &self,
        question: &str,
        summary: &str,
        context: &DataContext,
        question_id: i64,
    ) -> Vec<Insight> {
        match self.gateway.generate_insights(question, summary).await {
            Ok(payloads) => {
                let degraded = context.is_empty();
                payloads
                    .into_iter()
                    .take(MAX_INSIGHTS)
                    .map(|p| from_payload(p, context, question_id, degraded))
                    .collect()
            }
            Err(err) => {
                warn!("Insight generation fell back: {}", err);
                vec![fallback_insight(question_id)]
            }
        }
    }
}

fn from_payload(
    payload: InsightPayload,
    context: &DataContext,
    question_id: i64,
    degraded: bool,
) -> Insight {
    let confidence = if degraded {
        payload.confidence_score.min(DEGRADED_CONFIDENCE)
    } else {
        payload.confidence_score
    };

    Insight {
        id: 0,
        question_id,
        title: payload.title,
        description: payload.description,
        category: payload.category,
        confidence_score: confidence,
        data_sources: vec![context.data_source_tag().to_string()],
        action_items: payload.action_items,
        data_evidence: payload.data_evidence,
        created_at: Utc::now(),
    }
}

/// The deterministic insight used when the gateway cannot answer.
pub fn fallback_insight(question_id: i64) -> Insight {
    Insight {
        id: 0,
        question_id,
        title: "General Business Analysis".to_string(),
        description: "Analysis based on available business data".to_string(),
        category: InsightCategory::Summary,
        confidence_score: DEGRADED_CONFIDENCE,
        data_sources: vec!["fallback".to_string()],
        action_items: vec![
            "Review data regularly".to_string(),
            "Monitor key metrics".to_string(),
        ],
        data_evidence: vec!["Based on query analysis".to_string()],
        created_at: Utc::now(),
    }
}

/// Composes the recommendation list: every action item in order, deduplicated
/// case-insensitively, with two defaults when nothing remains.
pub fn recommendations(insights: &[Insight]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for insight in insights {
        for item in &insight.action_items {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_lowercase()) {
                out.push(trimmed.to_string());
            }
        }
    }

    if out.is_empty() {
        out.extend(DEFAULT_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{BusinessMetrics, DynamicContext};

    fn insight_with_actions(actions: &[&str]) -> Insight {
        let mut insight = fallback_insight(1);
        insight.action_items = actions.iter().map(|s| s.to_string()).collect();
        insight
    }

    #[test]
    fn fallback_insight_matches_contract() {
        let insight = fallback_insight(7);
        assert_eq!(insight.title, "General Business Analysis");
        assert_eq!(insight.category, InsightCategory::Summary);
        assert_eq!(insight.confidence_score, DEGRADED_CONFIDENCE);
        assert_eq!(insight.data_sources, vec!["fallback"]);
        assert_eq!(
            insight.action_items,
            vec!["Review data regularly", "Monitor key metrics"]
        );
        assert_eq!(insight.data_evidence, vec!["Based on query analysis"]);
        assert!(insight.is_valid());
    }

    #[test]
    fn recommendations_preserve_order_and_dedup() {
        let insights = vec![
            insight_with_actions(&["Audit Paris pricing", "Restock Runner X"]),
            insight_with_actions(&["restock runner x", "Review supplier terms"]),
        ];
        let recs = recommendations(&insights);
        assert_eq!(
            recs,
            vec![
                "Audit Paris pricing",
                "Restock Runner X",
                "Review supplier terms"
            ]
        );
    }

    #[test]
    fn empty_action_items_get_defaults() {
        let insights = vec![insight_with_actions(&[])];
        let recs = recommendations(&insights);
        assert_eq!(
            recs,
            vec![
                "Monitor trend continuation",
                "Consider implementing suggested actions"
            ]
        );
    }

    #[test]
    fn blank_action_items_are_skipped() {
        let insights = vec![insight_with_actions(&["  ", "Do the thing"])];
        assert_eq!(recommendations(&insights), vec!["Do the thing"]);
    }

    #[test]
    fn empty_context_caps_confidence() {
        let payload = InsightPayload {
            title: "Confident claim".into(),
            description: "Backed by nothing".into(),
            category: InsightCategory::Trend,
            confidence_score: 0.95,
            action_items: vec![],
            data_evidence: vec![],
        };
        let empty = DataContext::Dynamic(DynamicContext::empty("no matched source"));
        let insight = from_payload(payload.clone(), &empty, 1, empty.is_empty());
        assert_eq!(insight.confidence_score, DEGRADED_CONFIDENCE);

        let full = DataContext::Metrics(BusinessMetrics {
            total_revenue: 10.0,
            ..Default::default()
        });
        let insight = from_payload(payload, &full, 1, full.is_empty());
        assert_eq!(insight.confidence_score, 0.95);
    }

    #[test]
    fn payload_inherits_context_data_source() {
        let payload = InsightPayload {
            title: "t".into(),
            description: "d".into(),
            category: InsightCategory::Summary,
            confidence_score: 0.5,
            action_items: vec![],
            data_evidence: vec![],
        };
        let ctx = DataContext::Metrics(BusinessMetrics {
            total_revenue: 1.0,
            ..Default::default()
        });
        let insight = from_payload(payload, &ctx, 3, false);
        assert_eq!(insight.data_sources, vec!["business_metrics"]);
        assert_eq!(insight.question_id, 3);
    }
}
