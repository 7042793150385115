//! # Lumen NLP
//!
//! Intent analysis for natural-language business questions.
//!
//! Classification is LLM-backed through the gateway, with a deterministic
//! keyword fallback when the gateway is unavailable or returns off-schema
//! output. Classified intents are cached by question fingerprint; a cache
//! hit bypasses the gateway entirely.

pub mod analyzer;
pub mod intent;

pub use analyzer::IntentAnalyzer;
pub use intent::{fallback_intent, intent_from_response, keyword_intent};
