use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum question length accepted by the pipeline (after trimming).
pub const MAX_QUESTION_LEN: usize = 2000;
/// Minimum question length accepted by the pipeline (after trimming).
pub const MIN_QUESTION_LEN: usize = 3;
/// Maximum length of the opaque user tag.
pub const MAX_USER_TAG_LEN: usize = 255;

/// A submitted natural-language question.
///
/// Created once on ingestion and mutated exactly once when processing
/// completes (`processed` flips to true and `response` is filled in). The
/// text itself is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub user_id: Option<String>,
    pub processed: bool,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Builds an unpersisted question (id 0). The repository assigns the
    /// real id on insert; the orchestrator falls back to this form when the
    /// metadata store is unavailable.
    pub fn unpersisted(text: impl Into<String>, user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            text: text.into(),
            user_id,
            processed: false,
            response: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_processed(&mut self, summary: impl Into<String>) {
        self.processed = true;
        self.response = Some(summary.into());
        self.updated_at = Utc::now();
    }
}

/// Closed set of query intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    TrendAnalysis,
    Comparison,
    Prediction,
    RootCause,
    Recommendation,
    GeneralAnalysis,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::TrendAnalysis => "trend_analysis",
            IntentKind::Comparison => "comparison",
            IntentKind::Prediction => "prediction",
            IntentKind::RootCause => "root_cause",
            IntentKind::Recommendation => "recommendation",
            IntentKind::GeneralAnalysis => "general_analysis",
        }
    }

    /// Title-case form used in chart titles ("Root Cause", "Trend Analysis").
    pub fn title(&self) -> &'static str {
        match self {
            IntentKind::TrendAnalysis => "Trend Analysis",
            IntentKind::Comparison => "Comparison",
            IntentKind::Prediction => "Prediction",
            IntentKind::RootCause => "Root Cause",
            IntentKind::Recommendation => "Recommendation",
            IntentKind::GeneralAnalysis => "General Analysis",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of data-source families an intent may reference.
///
/// Unlike `categories`, which is free-form, this set is fixed; anything
/// else in a provider response is a schema violation. The `"fallback"`
/// marker lives only on degraded insights, never on an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceTag {
    SalesData,
    InventoryData,
    CustomerData,
    BusinessMetrics,
}

impl DataSourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceTag::SalesData => "sales_data",
            DataSourceTag::InventoryData => "inventory_data",
            DataSourceTag::CustomerData => "customer_data",
            DataSourceTag::BusinessMetrics => "business_metrics",
        }
    }
}

impl std::fmt::Display for DataSourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a question: what the user is asking for, how sure we
/// are, and which data families and chart shapes fit the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent: IntentKind,
    pub confidence: f64,
    pub categories: Vec<String>,
    pub data_sources: Vec<DataSourceTag>,
    pub suggested_visualizations: Vec<ChartKind>,
}

impl Intent {
    pub fn is_confident(&self) -> bool {
        self.confidence >= 0.7
    }
}

/// Closed set of insight categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Trend,
    Anomaly,
    Recommendation,
    Prediction,
    Correlation,
    Summary,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::Trend => "trend",
            InsightCategory::Anomaly => "anomaly",
            InsightCategory::Recommendation => "recommendation",
            InsightCategory::Prediction => "prediction",
            InsightCategory::Correlation => "correlation",
            InsightCategory::Summary => "summary",
        }
    }
}

impl std::fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InsightCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trend" => Ok(InsightCategory::Trend),
            "anomaly" => Ok(InsightCategory::Anomaly),
            "recommendation" => Ok(InsightCategory::Recommendation),
            "prediction" => Ok(InsightCategory::Prediction),
            "correlation" => Ok(InsightCategory::Correlation),
            "summary" => Ok(InsightCategory::Summary),
            other => Err(format!("unknown insight category: {other}")),
        }
    }
}

/// One atomic finding derived from a question and its data context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub id: i64,
    pub question_id: i64,
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
    pub confidence_score: f64,
    pub data_sources: Vec<String>,
    pub action_items: Vec<String>,
    pub data_evidence: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub const MAX_TITLE_LEN: usize = 200;
    pub const MAX_DESCRIPTION_LEN: usize = 2000;
    pub const MAX_ACTION_ITEMS: usize = 10;
    pub const MAX_EVIDENCE: usize = 10;

    /// Checks the entity contract: non-empty bounded strings, confidence in
    /// range, bounded lists.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && self.title.len() <= Self::MAX_TITLE_LEN
            && !self.description.trim().is_empty()
            && self.description.len() <= Self::MAX_DESCRIPTION_LEN
            && (0.0..=1.0).contains(&self.confidence_score)
            && self.action_items.len() <= Self::MAX_ACTION_ITEMS
            && self.data_evidence.len() <= Self::MAX_EVIDENCE
    }
}

/// Closed set of chart kinds the visualization builder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    BarChart,
    LineChart,
    PieChart,
    DoughnutChart,
    ScatterPlot,
    BubbleChart,
    RadarChart,
    HorizontalBarChart,
    StackedBarChart,
    MultiLineChart,
    AreaChart,
}

impl ChartKind {
    /// All chart kinds, in declaration order.
    pub const ALL: [ChartKind; 11] = [
        ChartKind::BarChart,
        ChartKind::LineChart,
        ChartKind::PieChart,
        ChartKind::DoughnutChart,
        ChartKind::ScatterPlot,
        ChartKind::BubbleChart,
        ChartKind::RadarChart,
        ChartKind::HorizontalBarChart,
        ChartKind::StackedBarChart,
        ChartKind::MultiLineChart,
        ChartKind::AreaChart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::BarChart => "bar_chart",
            ChartKind::LineChart => "line_chart",
            ChartKind::PieChart => "pie_chart",
            ChartKind::DoughnutChart => "doughnut_chart",
            ChartKind::ScatterPlot => "scatter_plot",
            ChartKind::BubbleChart => "bubble_chart",
            ChartKind::RadarChart => "radar_chart",
            ChartKind::HorizontalBarChart => "horizontal_bar_chart",
            ChartKind::StackedBarChart => "stacked_bar_chart",
            ChartKind::MultiLineChart => "multi_line_chart",
            ChartKind::AreaChart => "area_chart",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A renderable chart specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visualization {
    #[serde(rename = "type")]
    pub chart_type: ChartKind,
    pub title: String,
    pub data_source: String,
    pub data_points: usize,
    pub columns_used: Vec<String>,
    pub chart_data: serde_json::Value,
}

/// The full response returned to callers and stored in the query cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub query: Question,
    pub intent: Intent,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
    pub visualizations: Vec<Visualization>,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_starts_unprocessed() {
        let q = Question::unpersisted("Why are sales down?", Some("u1".into()));
        assert_eq!(q.id, 0);
        assert!(!q.processed);
        assert!(q.response.is_none());
    }

    #[test]
    fn mark_processed_fills_response() {
        let mut q = Question::unpersisted("Why are sales down?", None);
        q.mark_processed("Sales dipped in Paris");
        assert!(q.processed);
        assert_eq!(q.response.as_deref(), Some("Sales dipped in Paris"));
    }

    #[test]
    fn intent_kind_round_trips_snake_case() {
        let json = serde_json::to_string(&IntentKind::RootCause).unwrap();
        assert_eq!(json, "\"root_cause\"");
        let back: IntentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IntentKind::RootCause);
    }

    #[test]
    fn chart_kind_covers_closed_set() {
        assert_eq!(ChartKind::ALL.len(), 11);
        for kind in ChartKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn insight_contract_enforced() {
        let mut insight = Insight {
            id: 0,
            question_id: 1,
            title: "Paris revenue dipped 12%".into(),
            description: "Revenue fell from $50k to $44k over the quarter".into(),
            category: InsightCategory::Trend,
            confidence_score: 0.8,
            data_sources: vec!["sales_data".into()],
            action_items: vec!["Audit Paris store pricing".into()],
            data_evidence: vec!["Total Revenue: $44,000.00".into()],
            created_at: Utc::now(),
        };
        assert!(insight.is_valid());

        insight.title = String::new();
        assert!(!insight.is_valid());

        insight.title = "x".repeat(201);
        assert!(!insight.is_valid());

        insight.title = "ok".into();
        insight.confidence_score = 1.2;
        assert!(!insight.is_valid());
    }

    #[test]
    fn off_set_insight_category_is_rejected_by_serde() {
        let raw = "\"general_analysis\"";
        assert!(serde_json::from_str::<InsightCategory>(raw).is_err());
    }

    #[test]
    fn data_source_tags_round_trip_snake_case() {
        let json = serde_json::to_string(&DataSourceTag::BusinessMetrics).unwrap();
        assert_eq!(json, "\"business_metrics\"");
        let back: DataSourceTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DataSourceTag::BusinessMetrics);
    }

    #[test]
    fn off_set_data_source_is_rejected_by_serde() {
        // "fallback" marks degraded insights; it is not a valid intent
        // data source, and arbitrary names are rejected the same way.
        assert!(serde_json::from_str::<DataSourceTag>("\"fallback\"").is_err());
        assert!(serde_json::from_str::<DataSourceTag>("\"store_data\"").is_err());
    }
}
