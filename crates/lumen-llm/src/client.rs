//! Chat-completions client for the LLM provider.

use reqwest::{header, Client};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use async_trait::async_trait;
use lumen_core::config::LlmConfig;

use crate::error::{LlmError, Result};
use crate::ledger::CostLedger;
use crate::pacing::RequestPacer;
use crate::schema::{InsightPayload, InsightsResponse, IntentResponse};
use crate::LlmGateway;

/// Per-request timeout, including any rate-limit wait already served.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Completion cap for intent classification.
const INTENT_MAX_TOKENS: u32 = 300;
/// Completion cap for insight generation.
const INSIGHTS_MAX_TOKENS: u32 = 1024;

const INTENT_TEMPERATURE: f64 = 0.2;
const INSIGHTS_TEMPERATURE: f64 = 0.4;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// One instance is shared process-wide; the pacer and ledger inside it are
/// the global rate-limit clock and cost counters.
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
    api_key: Option<Secret<String>>,
    pacer: RequestPacer,
    ledger: Arc<CostLedger>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl LlmClient {
    pub fn new(config: LlmConfig, ledger: Arc<CostLedger>) -> Result<Self> {
        if config.api_key.is_none() {
            warn!("No LLM API key configured; gateway will serve fallbacks only");
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        let pacer = RequestPacer::new(config.min_interval());
        let api_key = config.api_key.clone().map(Secret::new);

        Ok(Self {
            http,
            config,
            api_key,
            pacer,
            ledger,
        })
    }

    pub fn ledger(&self) -> Arc<CostLedger> {
        Arc::clone(&self.ledger)
    }

    async fn send_chat(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::Disabled)?;

        self.pacer.wait().await;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!(model = %self.config.model, "Sending chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;

        let tokens = body.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0);
        let cost = tokens as f64 / 1000.0 * self.config.cost_per_1k_tokens;
        self.ledger.record(tokens, cost);
        info!("LLM call complete: cost ${:.4}, tokens {}", cost, tokens);

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::schema("response contained no choices"))?;

        Ok(content)
    }
}

/// Removes a surrounding markdown code fence, if the model added one
/// despite the JSON response format.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl LlmGateway for LlmClient {
    #[instrument(skip(self), fields(question_len = question.len()))]
    async fn classify_intent(&self, question: &str) -> Result<IntentResponse> {
        let system = "You are a retail business-intelligence analyst. Classify the \
                      intent of business questions and answer with a single JSON \
                      object matching the requested schema.";
        let user = format!(
            "Analyze the following business question and determine its intent.\n\
             \n\
             Question: \"{question}\"\n\
             \n\
             Respond with a JSON object with these fields:\n\
             - \"intent\": one of \"trend_analysis\", \"comparison\", \"prediction\", \
               \"root_cause\", \"recommendation\", \"general_analysis\"\n\
             - \"confidence\": number between 0.0 and 1.0\n\
             - \"categories\": non-empty list of relevant business categories \
               (e.g. \"sales\", \"performance\", \"inventory\", \"customers\")\n\
             - \"data_sources\": non-empty list drawn from \"sales_data\", \
               \"inventory_data\", \"customer_data\", \"business_metrics\"\n\
             - \"suggested_visualizations\": non-empty list of chart kinds, e.g. \
               \"bar_chart\", \"line_chart\", \"pie_chart\""
        );

        let content = self
            .send_chat(system, &user, INTENT_TEMPERATURE, INTENT_MAX_TOKENS)
            .await?;

        let parsed: IntentResponse = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| LlmError::schema(format!("intent response: {e}")))?;
        parsed.validate()?;

        info!(
            "Intent classified: {} (confidence {:.2})",
            parsed.intent, parsed.confidence
        );
        Ok(parsed)
    }

    #[instrument(skip(self, context_summary), fields(question_len = question.len()))]
    async fn generate_insights(
        &self,
        question: &str,
        context_summary: &str,
    ) -> Result<Vec<InsightPayload>> {
        let system = "You are a senior retail business analyst. Generate actionable, \
                      data-driven insights grounded in the provided context and answer \
                      with a single JSON object matching the requested schema.";
        let user = format!(
            "Based on the following business question and data context, generate 2-3 \
             actionable business insights.\n\
             \n\
             Question: \"{question}\"\n\
             \n\
             Data context:\n{context_summary}\n\
             \n\
             Requirements:\n\
             - Cite specific numbers from the data context in each insight.\n\
             - Keep action items concrete enough to execute this week.\n\
             - Respond with a JSON object {{\"insights\": [...]}} where each insight \
               has \"title\", \"description\", \"category\" (one of \"trend\", \
               \"anomaly\", \"recommendation\", \"prediction\", \"correlation\", \
               \"summary\"), \"confidence_score\" (0.0-1.0), \"action_items\" \
               (list of strings), and \"data_evidence\" (list of strings)."
        );

        let content = self
            .send_chat(system, &user, INSIGHTS_TEMPERATURE, INSIGHTS_MAX_TOKENS)
            .await?;

        let parsed: InsightsResponse = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| LlmError::schema(format!("insights response: {e}")))?;
        parsed.validate()?;

        info!("Generated {} insights", parsed.insights.len());
        Ok(parsed.insights)
    }
}
