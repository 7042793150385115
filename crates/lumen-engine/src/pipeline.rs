//! Pipeline orchestration.
//!
//! `process` turns a raw question into a grounded, cached, structured
//! response. Every collaborator failure short of input validation is
//! absorbed: the LLM degrades to deterministic fallbacks, the warehouse to
//! empty contexts, the metadata store to in-memory questions, and the
//! cache to misses. A valid question always gets a successful envelope.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use lumen_cache::{CacheStatsSnapshot, Namespace, QueryCache};
use lumen_core::{
    fingerprint, normalize, AppError, AppResult, DataContext, DynamicContext, Insight, Question,
    ResponseEnvelope, MAX_QUESTION_LEN, MAX_USER_TAG_LEN, MIN_QUESTION_LEN,
};
use lumen_llm::{CostLedger, CostSummary, LlmGateway};
use lumen_nlp::{fallback_intent, IntentAnalyzer};
use lumen_store::QuestionStore;
use lumen_warehouse::WarehouseReader;

use crate::context::ContextRetriever;
use crate::insights::{fallback_insight, recommendations, InsightGenerator};
use crate::summary::format_summary;
use crate::viz::build_visualizations;

/// Timeout for each metadata-store round trip.
const STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Builder wiring the pipeline's collaborators together.
pub struct PipelineBuilder {
    gateway: Arc<dyn LlmGateway>,
    warehouse: Arc<dyn WarehouseReader>,
    cache: QueryCache,
    store: Option<Arc<dyn QuestionStore>>,
    ledger: Arc<CostLedger>,
    request_timeout: Duration,
}

impl PipelineBuilder {
    pub fn new(gateway: Arc<dyn LlmGateway>, warehouse: Arc<dyn WarehouseReader>) -> Self {
        Self {
            gateway,
            warehouse,
            cache: QueryCache::disabled(),
            store: None,
            ledger: Arc::new(CostLedger::new()),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn QuestionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<CostLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn build(self) -> QueryPipeline {
        QueryPipeline {
            analyzer: IntentAnalyzer::new(Arc::clone(&self.gateway), self.cache.clone()),
            retriever: ContextRetriever::new(self.warehouse, self.cache.clone()),
            generator: InsightGenerator::new(self.gateway),
            cache: self.cache,
            store: self.store,
            ledger: self.ledger,
            request_timeout: self.request_timeout,
        }
    }
}

/// The query-to-insight orchestrator.
pub struct QueryPipeline {
    cache: QueryCache,
    analyzer: IntentAnalyzer,
    retriever: ContextRetriever,
    generator: InsightGenerator,
    store: Option<Arc<dyn QuestionStore>>,
    ledger: Arc<CostLedger>,
    request_timeout: Duration,
}

impl QueryPipeline {
    /// Processes a question end to end. The only error path is input
    /// validation; every downstream failure degrades per component policy.
    #[instrument(skip(self, query_text), fields(text_len = query_text.len()))]
    pub async fn process(
        &self,
        query_text: &str,
        user_tag: Option<&str>,
    ) -> AppResult<ResponseEnvelope> {
        let started = Instant::now();
        let normalized = normalize(query_text);
        validate_input(&normalized, user_tag)?;

        let correlation = Uuid::new_v4();
        let fp = fingerprint(&normalized);
        info!(
            %correlation,
            text_len = normalized.chars().count(),
            user_tag = user_tag.unwrap_or("-"),
            "Processing question"
        );

        let cost_before = self.ledger.total_cost();

        if let Some(mut envelope) = self
            .cache
            .get::<ResponseEnvelope>(Namespace::Query, &fp)
            .await
        {
            envelope.cached_at = Some(Utc::now());
            info!(
                %correlation,
                question_id = envelope.query.id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                cache_hit = true,
                insights = envelope.insights.len(),
                cost_usd = 0.0,
                "Question served from cache"
            );
            return Ok(envelope);
        }

        let mut question = self.create_question(&normalized, user_tag, &correlation).await;

        let intent = match timeout(self.remaining(started), self.analyzer.analyze(&normalized)).await
        {
            Ok(intent) => intent,
            Err(_) => {
                warn!(%correlation, "Intent analysis timed out, using keyword fallback");
                fallback_intent(&normalized)
            }
        };

        let context = match timeout(self.remaining(started), self.retriever.retrieve(&normalized))
            .await
        {
            Ok(context) => context,
            Err(_) => {
                warn!(%correlation, "Context retrieval timed out, using empty context");
                DataContext::Dynamic(DynamicContext::empty("data retrieval timed out"))
            }
        };
        let summary = format_summary(&context);

        let mut insights = match timeout(
            self.remaining(started),
            self.generator
                .generate(&normalized, &summary, &context, question.id),
        )
        .await
        {
            Ok(insights) => insights,
            Err(_) => {
                warn!(%correlation, "Insight generation timed out, using fallback insight");
                vec![fallback_insight(question.id)]
            }
        };

        let recommendations = recommendations(&insights);
        let visualizations = build_visualizations(&intent, &context);

        let response_summary = insights
            .first()
            .map(|i| i.title.clone())
            .unwrap_or_else(|| "Processed".to_string());
        self.persist_results(&mut question, &mut insights, &response_summary, &correlation)
            .await;
        question.mark_processed(&response_summary);

        let envelope = ResponseEnvelope {
            success: true,
            query: question,
            intent,
            insights,
            recommendations,
            visualizations,
            processed_at: Utc::now(),
            cached_at: None,
        };

        self.cache.set(Namespace::Query, &fp, &envelope).await;

        let cost_delta = self.ledger.total_cost() - cost_before;
        info!(
            %correlation,
            question_id = envelope.query.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            cache_hit = false,
            insights = envelope.insights.len(),
            cost_usd = cost_delta,
            "Question processed"
        );

        Ok(envelope)
    }

    async fn create_question(
        &self,
        normalized: &str,
        user_tag: Option<&str>,
        correlation: &Uuid,
    ) -> Question {
        let Some(store) = &self.store else {
            debug!(%correlation, "No metadata store configured, using in-memory question");
            return Question::unpersisted(normalized, user_tag.map(String::from));
        };

        match timeout(STORE_TIMEOUT, store.create(normalized, user_tag)).await {
            Ok(Ok(question)) => question,
            Ok(Err(err)) => {
                warn!(%correlation, "Question persistence failed, continuing in memory: {}", err);
                Question::unpersisted(normalized, user_tag.map(String::from))
            }
            Err(_) => {
                warn!(%correlation, "Question persistence timed out, continuing in memory");
                Question::unpersisted(normalized, user_tag.map(String::from))
            }
        }
    }

    async fn persist_results(
        &self,
        question: &mut Question,
        insights: &mut Vec<Insight>,
        response_summary: &str,
        correlation: &Uuid,
    ) {
        let Some(store) = &self.store else {
            return;
        };
        if question.id == 0 {
            return;
        }

        match timeout(STORE_TIMEOUT, store.store_insights(question.id, insights)).await {
            Ok(Ok(stored)) => *insights = stored,
            Ok(Err(err)) => warn!(%correlation, "Insight persistence failed: {}", err),
            Err(_) => warn!(%correlation, "Insight persistence timed out"),
        }

        match timeout(
            STORE_TIMEOUT,
            store.mark_processed(question.id, response_summary),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%correlation, "Marking question processed failed: {}", err),
            Err(_) => warn!(%correlation, "Marking question processed timed out"),
        }
    }

    fn remaining(&self, started: Instant) -> Duration {
        self.request_timeout.saturating_sub(started.elapsed())
    }

    /// Looks up a stored question by id.
    pub async fn question(&self, id: i64) -> AppResult<Option<Question>> {
        match &self.store {
            Some(store) => store.get(id).await.map_err(Into::into),
            None => Ok(None),
        }
    }

    /// Pages stored questions, newest first.
    pub async fn questions(&self, offset: i64, limit: i64) -> AppResult<Vec<Question>> {
        match &self.store {
            Some(store) => store.list(offset, limit).await.map_err(Into::into),
            None => Ok(Vec::new()),
        }
    }

    /// Fetches the stored insights of a question.
    pub async fn insights_for(&self, question_id: i64) -> AppResult<Vec<Insight>> {
        match &self.store {
            Some(store) => store.insights_for(question_id).await.map_err(Into::into),
            None => Ok(Vec::new()),
        }
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    pub fn cost_summary(&self) -> CostSummary {
        self.ledger.summary()
    }
}

fn validate_input(normalized: &str, user_tag: Option<&str>) -> AppResult<()> {
    let len = normalized.chars().count();
    if len < MIN_QUESTION_LEN {
        return Err(AppError::validation(format!(
            "query text must be at least {MIN_QUESTION_LEN} characters after trimming"
        )));
    }
    if len > MAX_QUESTION_LEN {
        return Err(AppError::validation(format!(
            "query text must be at most {MAX_QUESTION_LEN} characters"
        )));
    }
    if let Some(tag) = user_tag {
        if tag.chars().count() > MAX_USER_TAG_LEN {
            return Err(AppError::validation(format!(
                "user tag must be at most {MAX_USER_TAG_LEN} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::ErrorKind;

    #[test]
    fn length_boundaries() {
        assert_eq!(
            validate_input("hi", None).unwrap_err().kind,
            ErrorKind::Validation
        );
        assert!(validate_input("hey", None).is_ok());
        assert!(validate_input(&"a".repeat(2000), None).is_ok());
        assert_eq!(
            validate_input(&"a".repeat(2001), None).unwrap_err().kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn user_tag_boundary() {
        assert!(validate_input("valid question", Some(&"u".repeat(255))).is_ok());
        assert_eq!(
            validate_input("valid question", Some(&"u".repeat(256)))
                .unwrap_err()
                .kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn validation_counts_characters_not_bytes() {
        // Three multibyte characters are exactly the minimum length.
        assert!(validate_input("déjà", None).is_ok());
        assert!(validate_input("éé", None).is_err());
    }
}
