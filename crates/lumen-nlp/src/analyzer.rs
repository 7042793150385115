//! Caching intent analyzer.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use lumen_cache::{Namespace, QueryCache};
use lumen_core::{fingerprint, Intent};
use lumen_llm::LlmGateway;

use crate::intent::{fallback_intent, intent_from_response};

/// Classifies questions through the LLM gateway, with fingerprint-keyed
/// caching and the keyword fallback when the gateway cannot answer.
pub struct IntentAnalyzer {
    gateway: Arc<dyn LlmGateway>,
    cache: QueryCache,
}

impl IntentAnalyzer {
    pub fn new(gateway: Arc<dyn LlmGateway>, cache: QueryCache) -> Self {
        Self { gateway, cache }
    }

    /// Returns the intent for a question. Never fails: gateway errors
    /// degrade to the deterministic keyword classification.
    #[instrument(skip(self), fields(question_len = question.len()))]
    pub async fn analyze(&self, question: &str) -> Intent {
        let fp = fingerprint(question);

        if let Some(cached) = self.cache.get::<Intent>(Namespace::Intent, &fp).await {
            debug!("Intent served from cache");
            return cached;
        }

        match self.gateway.classify_intent(question).await {
            Ok(response) => {
                let intent = intent_from_response(response);
                // Only model-derived intents are worth pinning for the
                // full TTL; fallbacks stay recomputable.
                self.cache.set(Namespace::Intent, &fp, &intent).await;
                intent
            }
            Err(err) => {
                warn!("Intent classification fell back to keyword rules: {}", err);
                fallback_intent(question)
            }
        }
    }
}
