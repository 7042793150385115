//! Keyword-rule intent classification and response conversion.

use lumen_core::{ChartKind, DataSourceTag, Intent, IntentKind};
use lumen_llm::IntentResponse;

/// Confidence assigned to every keyword-rule classification.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Ordered keyword rules; the first rule with any match wins.
const RULES: &[(&[&str], IntentKind)] = &[
    (&["trend", "pattern", "over time"], IntentKind::TrendAnalysis),
    (
        &["compare", "vs", "versus", "difference"],
        IntentKind::Comparison,
    ),
    (&["predict", "forecast", "future"], IntentKind::Prediction),
    (&["why", "cause", "reason"], IntentKind::RootCause),
    (
        &["recommend", "suggest", "action"],
        IntentKind::Recommendation,
    ),
];

/// Classifies a question by keyword containment, case-insensitively.
pub fn keyword_intent(text: &str) -> IntentKind {
    let lower = text.to_lowercase();
    for (keywords, intent) in RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *intent;
        }
    }
    IntentKind::GeneralAnalysis
}

/// The deterministic intent used when the LLM gateway cannot answer.
pub fn fallback_intent(text: &str) -> Intent {
    Intent {
        intent: keyword_intent(text),
        confidence: FALLBACK_CONFIDENCE,
        categories: vec!["sales".to_string(), "performance".to_string()],
        data_sources: vec![DataSourceTag::SalesData],
        suggested_visualizations: ChartKind::ALL.to_vec(),
    }
}

/// Converts a validated gateway response into the domain intent.
pub fn intent_from_response(response: IntentResponse) -> Intent {
    Intent {
        intent: response.intent,
        confidence: response.confidence,
        categories: response.categories,
        data_sources: response.data_sources,
        suggested_visualizations: response.suggested_visualizations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_keywords_win() {
        assert_eq!(
            keyword_intent("Show me sales trends this year"),
            IntentKind::TrendAnalysis
        );
        assert_eq!(
            keyword_intent("How did revenue move OVER TIME?"),
            IntentKind::TrendAnalysis
        );
    }

    #[test]
    fn comparison_keywords() {
        assert_eq!(
            keyword_intent("Compare sales across regions"),
            IntentKind::Comparison
        );
        assert_eq!(keyword_intent("Paris vs Lyon"), IntentKind::Comparison);
    }

    #[test]
    fn prediction_keywords() {
        assert_eq!(
            keyword_intent("Forecast demand for Q4"),
            IntentKind::Prediction
        );
    }

    #[test]
    fn root_cause_keywords() {
        assert_eq!(
            keyword_intent("Why are shoe sales down in Paris?"),
            IntentKind::RootCause
        );
    }

    #[test]
    fn recommendation_keywords() {
        assert_eq!(
            keyword_intent("Suggest ways to improve margins"),
            IntentKind::Recommendation
        );
    }

    #[test]
    fn unmatched_text_is_general() {
        assert_eq!(keyword_intent("Hello there"), IntentKind::GeneralAnalysis);
    }

    #[test]
    fn rules_apply_in_order() {
        // Contains both "trend" and "compare"; the trend rule is first.
        assert_eq!(
            keyword_intent("Compare the sales trend between stores"),
            IntentKind::TrendAnalysis
        );
    }

    #[test]
    fn fallback_intent_shape() {
        let intent = fallback_intent("Compare sales across regions");
        assert_eq!(intent.intent, IntentKind::Comparison);
        assert_eq!(intent.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(intent.categories, vec!["sales", "performance"]);
        assert_eq!(intent.data_sources, vec![DataSourceTag::SalesData]);
        assert_eq!(intent.suggested_visualizations.len(), ChartKind::ALL.len());
    }
}
