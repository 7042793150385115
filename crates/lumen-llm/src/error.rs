//! LLM gateway error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured; the gateway is permanently in fallback mode.
    #[error("LLM gateway disabled: no API key configured")]
    Disabled,

    #[error("LLM transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered, but the body did not satisfy the declared
    /// response schema.
    #[error("LLM response violated schema: {0}")]
    Schema(String),
}

impl LlmError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }
}

impl From<LlmError> for lumen_core::AppError {
    fn from(err: LlmError) -> Self {
        match &err {
            LlmError::Http(http) if http.is_timeout() => {
                lumen_core::AppError::timeout(err.to_string())
            }
            LlmError::Schema(_) => lumen_core::AppError::llm_schema(err.to_string()),
            _ => lumen_core::AppError::llm_unavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::ErrorKind;

    #[test]
    fn disabled_maps_to_llm_unavailable() {
        let app: lumen_core::AppError = LlmError::Disabled.into();
        assert_eq!(app.kind, ErrorKind::LlmUnavailable);
    }

    #[test]
    fn schema_violation_maps_to_llm_schema() {
        let app: lumen_core::AppError = LlmError::schema("missing field `intent`").into();
        assert_eq!(app.kind, ErrorKind::LlmSchema);
    }
}
