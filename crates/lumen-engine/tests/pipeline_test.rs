//! End-to-end pipeline scenarios over scripted collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lumen_cache::{MemoryBackend, QueryCache};
use lumen_core::{
    BusinessMetrics, ChartKind, CustomerRecord, DataSourceTag, DynamicContext, ErrorKind,
    InsightCategory, IntentKind, InventoryRecord, SalesRecord,
};
use lumen_engine::PipelineBuilder;
use lumen_llm::{InsightPayload, IntentResponse, LlmError, LlmGateway};
use lumen_store::{MemoryStore, QuestionStore};
use lumen_warehouse::{AggregateSpec, DisabledWarehouse, WarehouseReader};

struct ScriptedGateway {
    intent: Option<IntentResponse>,
    insights: Option<Vec<InsightPayload>>,
    intent_calls: AtomicUsize,
    insight_calls: AtomicUsize,
}

impl ScriptedGateway {
    fn new(intent: IntentResponse, insights: Vec<InsightPayload>) -> Self {
        Self {
            intent: Some(intent),
            insights: Some(insights),
            intent_calls: AtomicUsize::new(0),
            insight_calls: AtomicUsize::new(0),
        }
    }

    fn unavailable() -> Self {
        Self {
            intent: None,
            insights: None,
            intent_calls: AtomicUsize::new(0),
            insight_calls: AtomicUsize::new(0),
        }
    }

    fn total_calls(&self) -> usize {
        self.intent_calls.load(Ordering::SeqCst) + self.insight_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn classify_intent(&self, _question: &str) -> lumen_llm::Result<IntentResponse> {
        self.intent_calls.fetch_add(1, Ordering::SeqCst);
        self.intent.clone().ok_or(LlmError::Disabled)
    }

    async fn generate_insights(
        &self,
        _question: &str,
        _context_summary: &str,
    ) -> lumen_llm::Result<Vec<InsightPayload>> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);
        self.insights.clone().ok_or(LlmError::Disabled)
    }
}

struct FixtureWarehouse;

fn sale(date: (i32, u32, u32), product: &str, store: &str, revenue: f64) -> SalesRecord {
    SalesRecord {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        product: product.to_string(),
        category: "Shoes".to_string(),
        store: store.to_string(),
        quantity_sold: 3,
        revenue,
        cost: revenue * 0.7,
        profit: revenue * 0.3,
        region: "EU".to_string(),
    }
}

#[async_trait]
impl WarehouseReader for FixtureWarehouse {
    async fn sales(&self, _days: u32) -> Vec<SalesRecord> {
        vec![
            sale((2026, 7, 1), "Runner X", "Paris", 500.0),
            sale((2026, 7, 2), "Runner X", "Paris", 420.0),
            sale((2026, 7, 3), "Walker Y", "Lyon", 260.0),
            sale((2026, 7, 4), "Walker Y", "Paris", 190.0),
        ]
    }

    async fn inventory(&self) -> Vec<InventoryRecord> {
        vec![
            InventoryRecord {
                store: "Paris".into(),
                product: "Runner X".into(),
                current_stock: 480,
                reorder_level: 50,
                max_stock: 200,
                last_restocked: None,
                supplier: "Acme".into(),
                status: "overstocked".into(),
            },
            InventoryRecord {
                store: "Lyon".into(),
                product: "Walker Y".into(),
                current_stock: 12,
                reorder_level: 40,
                max_stock: 150,
                last_restocked: None,
                supplier: "Acme".into(),
                status: "active".into(),
            },
        ]
    }

    async fn customers(&self, _limit: u32) -> Vec<CustomerRecord> {
        Vec::new()
    }

    async fn metrics(&self) -> BusinessMetrics {
        BusinessMetrics::default()
    }

    async fn run_aggregate(&self, spec: &AggregateSpec) -> DynamicContext {
        DynamicContext::empty(spec.description())
    }
}

fn memory_cache() -> QueryCache {
    QueryCache::new(Arc::new(MemoryBackend::unswept()), Duration::from_secs(3600))
}

fn root_cause_intent() -> IntentResponse {
    IntentResponse {
        intent: IntentKind::RootCause,
        confidence: 0.88,
        categories: vec!["sales".into(), "store_performance".into()],
        data_sources: vec![DataSourceTag::SalesData],
        suggested_visualizations: vec![ChartKind::BarChart, ChartKind::StackedBarChart],
    }
}

fn sales_insights() -> Vec<InsightPayload> {
    vec![
        InsightPayload {
            title: "Paris revenue concentrated in Runner X".into(),
            description: "Runner X drove $920.00 of the $1,370.00 total revenue".into(),
            category: InsightCategory::Anomaly,
            confidence_score: 0.82,
            action_items: vec!["Audit Paris pricing for Runner X".into()],
            data_evidence: vec!["Total Revenue: $1,370.00".into(), "Runner X: $920.00".into()],
        },
        InsightPayload {
            title: "Margin holding at 30%".into(),
            description: "Profit tracked revenue at a steady 30.0% margin".into(),
            category: InsightCategory::Trend,
            confidence_score: 0.75,
            action_items: vec!["Monitor margin weekly".into()],
            data_evidence: vec!["Margin: 30.0%".into()],
        },
    ]
}

#[tokio::test]
async fn s1_sales_root_cause_warm_path() {
    let gateway = Arc::new(ScriptedGateway::new(root_cause_intent(), sales_insights()));
    let pipeline = PipelineBuilder::new(gateway, Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .build();

    let envelope = pipeline
        .process("Why are shoe sales down in Paris stores this quarter?", Some("u1"))
        .await
        .unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.intent.intent, IntentKind::RootCause);
    assert!(envelope
        .intent
        .data_sources
        .contains(&DataSourceTag::SalesData));
    assert!(envelope
        .insights
        .iter()
        .any(|i| i.data_evidence.iter().any(|e| e.contains('$'))));
    assert!(envelope
        .visualizations
        .iter()
        .any(|v| matches!(v.chart_type, ChartKind::BarChart | ChartKind::StackedBarChart)));
}

#[tokio::test]
async fn s2_trend_gets_trend_shaped_first_visualization() {
    let intent = IntentResponse {
        intent: IntentKind::TrendAnalysis,
        confidence: 0.9,
        categories: vec!["sales".into()],
        data_sources: vec![DataSourceTag::SalesData],
        suggested_visualizations: vec![ChartKind::LineChart, ChartKind::AreaChart],
    };
    let gateway = Arc::new(ScriptedGateway::new(intent, sales_insights()));
    let pipeline = PipelineBuilder::new(gateway, Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .build();

    let envelope = pipeline
        .process("Show me revenue trends over the last 6 months", None)
        .await
        .unwrap();

    let first = &envelope.visualizations[0];
    assert!(matches!(
        first.chart_type,
        ChartKind::LineChart | ChartKind::AreaChart | ChartKind::MultiLineChart
    ));
    assert!(first.data_points >= 2);
}

#[tokio::test]
async fn s3_overstock_is_inventory_grounded() {
    let intent = IntentResponse {
        intent: IntentKind::GeneralAnalysis,
        confidence: 0.7,
        categories: vec!["inventory".into()],
        data_sources: vec![DataSourceTag::InventoryData],
        suggested_visualizations: vec![ChartKind::BarChart],
    };
    let insights = vec![InsightPayload {
        title: "Runner X heavily overstocked in Paris".into(),
        description: "480 units on hand against a 200-unit maximum".into(),
        category: InsightCategory::Anomaly,
        confidence_score: 0.8,
        action_items: vec!["Pause Runner X restocking in Paris".into()],
        data_evidence: vec!["Runner X at Paris: 480 units".into()],
    }];
    let gateway = Arc::new(ScriptedGateway::new(intent, insights));
    let pipeline = PipelineBuilder::new(gateway, Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .build();

    let envelope = pipeline
        .process("Which products are overstocked?", None)
        .await
        .unwrap();

    assert!((1..=3).contains(&envelope.insights.len()));
    // Inventory grounding shows in the insight data sources.
    assert!(envelope
        .insights
        .iter()
        .all(|i| i.data_sources == vec!["inventory_data".to_string()]));
    assert!(envelope
        .recommendations
        .iter()
        .any(|r| r.to_lowercase().contains("stock")));
}

#[tokio::test]
async fn s4_second_identical_question_hits_cache() {
    let gateway = Arc::new(ScriptedGateway::new(root_cause_intent(), sales_insights()));
    let pipeline = PipelineBuilder::new(gateway.clone(), Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .build();

    let question = "Why are shoe sales down in Paris stores this quarter?";
    let first = pipeline.process(question, Some("u1")).await.unwrap();
    let calls_after_first = gateway.total_calls();

    let second = pipeline.process(question, Some("u1")).await.unwrap();

    // No further gateway traffic, and the envelope is the cached one.
    assert_eq!(gateway.total_calls(), calls_after_first);
    assert!(second.cached_at.is_some());
    assert_eq!(
        serde_json::to_string(&first.intent).unwrap(),
        serde_json::to_string(&second.intent).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.insights).unwrap(),
        serde_json::to_string(&second.insights).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.visualizations).unwrap(),
        serde_json::to_string(&second.visualizations).unwrap()
    );
}

#[tokio::test]
async fn s5_llm_disabled_uses_keyword_fallbacks() {
    let gateway = Arc::new(ScriptedGateway::unavailable());
    let pipeline = PipelineBuilder::new(gateway, Arc::new(DisabledWarehouse)).build();

    let envelope = pipeline
        .process("Compare sales across regions", None)
        .await
        .unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.intent.intent, IntentKind::Comparison);
    assert_eq!(envelope.intent.confidence, 0.6);
    assert_eq!(envelope.insights.len(), 1);
    assert_eq!(envelope.insights[0].title, "General Business Analysis");
    assert_eq!(envelope.insights[0].confidence_score, 0.6);
    assert_eq!(envelope.insights[0].data_sources, vec!["fallback"]);
    assert!(envelope.visualizations.is_empty());
}

#[tokio::test]
async fn s6_short_text_is_rejected() {
    let gateway = Arc::new(ScriptedGateway::unavailable());
    let pipeline = PipelineBuilder::new(gateway, Arc::new(DisabledWarehouse)).build();

    let err = pipeline.process("hi", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn all_collaborators_down_still_succeeds() {
    // LLM, warehouse, and metadata store all unavailable: the envelope is
    // still a success with fallback intent, fallback insight, no charts.
    let gateway = Arc::new(ScriptedGateway::unavailable());
    let pipeline = PipelineBuilder::new(gateway, Arc::new(DisabledWarehouse)).build();

    let envelope = pipeline
        .process("Why did checkout conversion drop?", None)
        .await
        .unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.intent.intent, IntentKind::RootCause);
    assert_eq!(envelope.insights[0].data_sources, vec!["fallback"]);
    assert!(envelope.visualizations.is_empty());
    assert_eq!(envelope.query.id, 0);
    assert!(envelope.query.processed);
}

#[tokio::test]
async fn envelope_invariants_hold() {
    let gateway = Arc::new(ScriptedGateway::new(root_cause_intent(), sales_insights()));
    let pipeline = PipelineBuilder::new(gateway, Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .build();

    let envelope = pipeline
        .process("Why are shoe sales down in Paris stores this quarter?", None)
        .await
        .unwrap();

    assert!((1..=3).contains(&envelope.insights.len()));
    assert!(envelope.visualizations.len() <= 3);
    for insight in &envelope.insights {
        assert!((0.0..=1.0).contains(&insight.confidence_score));
        assert!(!insight.title.is_empty());
        assert!(!insight.description.is_empty());
    }

    let lowered: Vec<String> = envelope
        .recommendations
        .iter()
        .map(|r| r.to_lowercase())
        .collect();
    let unique: std::collections::HashSet<&String> = lowered.iter().collect();
    assert_eq!(unique.len(), lowered.len());

    for viz in &envelope.visualizations {
        let labels = viz.chart_data["data"]["labels"].as_array().unwrap();
        assert_eq!(viz.data_points, labels.len());
        for dataset in viz.chart_data["data"]["datasets"].as_array().unwrap() {
            assert_eq!(dataset["data"].as_array().unwrap().len(), viz.data_points);
        }
    }
}

#[tokio::test]
async fn questions_and_insights_are_persisted() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(ScriptedGateway::new(root_cause_intent(), sales_insights()));
    let pipeline = PipelineBuilder::new(gateway, Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .with_store(store.clone())
        .build();

    let envelope = pipeline
        .process("Why are shoe sales down in Paris?", Some("u1"))
        .await
        .unwrap();

    assert!(envelope.query.id > 0);
    assert!(envelope.insights.iter().all(|i| i.id > 0));

    let stored = store.get(envelope.query.id).await.unwrap().unwrap();
    assert!(stored.processed);
    assert_eq!(
        stored.response.as_deref(),
        Some(envelope.insights[0].title.as_str())
    );

    let stored_insights = pipeline.insights_for(envelope.query.id).await.unwrap();
    assert_eq!(stored_insights.len(), envelope.insights.len());

    let page = pipeline.questions(0, 10).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn whitespace_variants_share_the_cached_envelope() {
    let gateway = Arc::new(ScriptedGateway::new(root_cause_intent(), sales_insights()));
    let pipeline = PipelineBuilder::new(gateway.clone(), Arc::new(FixtureWarehouse))
        .with_cache(memory_cache())
        .build();

    pipeline
        .process("Why are shoe sales down in Paris?", None)
        .await
        .unwrap();
    let calls = gateway.total_calls();

    let second = pipeline
        .process("  Why   are shoe sales down in Paris?  ", None)
        .await
        .unwrap();

    assert_eq!(gateway.total_calls(), calls);
    assert!(second.cached_at.is_some());
}
