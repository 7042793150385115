//! # Lumen Store
//!
//! Durable storage for submitted questions and their generated insights,
//! backed by the transactional metadata database.
//!
//! The orchestrator tolerates this store being down: every failure here is
//! absorbed into an in-memory question and a log line, never an aborted
//! request.

pub mod memory;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgQuestionStore;

use lumen_core::{Insight, Question};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("metadata database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("question {0} not found")]
    NotFound(i64),

    #[error("metadata decode error: {0}")]
    Decode(String),
}

impl From<StoreError> for lumen_core::AppError {
    fn from(err: StoreError) -> Self {
        lumen_core::AppError::metadata_unavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Repository contract for questions and insights.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Persists a new question with `processed = false` and assigns its id.
    async fn create(&self, text: &str, user_id: Option<&str>) -> Result<Question>;

    /// Marks a question processed with a response summary.
    async fn mark_processed(&self, id: i64, summary: &str) -> Result<()>;

    async fn get(&self, id: i64) -> Result<Option<Question>>;

    /// Paged retrieval, newest first.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Question>>;

    /// Batch-inserts insights for a question, all or nothing. Returns the
    /// inserted insights with their assigned ids.
    async fn store_insights(&self, question_id: i64, insights: &[Insight]) -> Result<Vec<Insight>>;

    async fn insights_for(&self, question_id: i64) -> Result<Vec<Insight>>;
}
