//! Postgres-backed question repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, info};

use lumen_core::{Insight, InsightCategory, Question};

use crate::schema::ensure_schema;
use crate::{QuestionStore, Result, StoreError};

const POOL_SIZE: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    /// Connects to the metadata database and bootstraps the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to metadata store");
        let pool = PgPoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_question(row: &PgRow) -> Result<Question> {
    Ok(Question {
        id: row.try_get::<i64, _>("id")?,
        text: row.try_get("text")?,
        user_id: row.try_get("user_id")?,
        processed: row.try_get("processed")?,
        response: row.try_get("response")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn map_insight(row: &PgRow) -> Result<Insight> {
    let category: String = row.try_get("category")?;
    let category: InsightCategory = category.parse().map_err(StoreError::Decode)?;

    let string_list = |value: serde_json::Value| -> Result<Vec<String>> {
        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
    };

    Ok(Insight {
        id: row.try_get::<i64, _>("id")?,
        question_id: row.try_get::<i64, _>("question_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category,
        confidence_score: row.try_get("confidence_score")?,
        data_sources: string_list(row.try_get::<serde_json::Value, _>("data_sources")?)?,
        action_items: string_list(row.try_get::<serde_json::Value, _>("action_items")?)?,
        data_evidence: string_list(row.try_get::<serde_json::Value, _>("data_evidence")?)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn create(&self, text: &str, user_id: Option<&str>) -> Result<Question> {
        debug!("Persisting new question ({} chars)", text.len());
        let row = sqlx::query(
            "INSERT INTO questions (text, user_id) VALUES ($1, $2) \
             RETURNING id, text, user_id, processed, response, created_at, updated_at",
        )
        .bind(text)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        map_question(&row)
    }

    async fn mark_processed(&self, id: i64, summary: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE questions \
             SET processed = TRUE, response = $2, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(summary)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Question>> {
        let row = sqlx::query(
            "SELECT id, text, user_id, processed, response, created_at, updated_at \
             FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_question).transpose()
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            "SELECT id, text, user_id, processed, response, created_at, updated_at \
             FROM questions \
             ORDER BY created_at DESC, id DESC \
             OFFSET $1 LIMIT $2",
        )
        .bind(offset.max(0))
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_question).collect()
    }

    async fn store_insights(&self, question_id: i64, insights: &[Insight]) -> Result<Vec<Insight>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(insights.len());

        for insight in insights {
            let row = sqlx::query(
                "INSERT INTO insights \
                 (question_id, title, description, category, confidence_score, \
                  data_sources, action_items, data_evidence) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 RETURNING id, created_at",
            )
            .bind(question_id)
            .bind(&insight.title)
            .bind(&insight.description)
            .bind(insight.category.as_str())
            .bind(insight.confidence_score)
            .bind(serde_json::json!(insight.data_sources))
            .bind(serde_json::json!(insight.action_items))
            .bind(serde_json::json!(insight.data_evidence))
            .fetch_one(&mut *tx)
            .await?;

            let mut persisted = insight.clone();
            persisted.id = row.try_get::<i64, _>("id")?;
            persisted.question_id = question_id;
            persisted.created_at = row.try_get::<DateTime<Utc>, _>("created_at")?;
            stored.push(persisted);
        }

        tx.commit().await?;
        debug!(
            "Stored {} insights for question {}",
            stored.len(),
            question_id
        );
        Ok(stored)
    }

    async fn insights_for(&self, question_id: i64) -> Result<Vec<Insight>> {
        let rows = sqlx::query(
            "SELECT id, question_id, title, description, category, confidence_score, \
             data_sources, action_items, data_evidence, created_at \
             FROM insights WHERE question_id = $1 ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_insight).collect()
    }
}
