//! Metadata-store schema bootstrap.

use sqlx::PgPool;
use tracing::info;

use crate::Result;

const CREATE_QUESTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS questions (
    id          BIGSERIAL PRIMARY KEY,
    text        TEXT NOT NULL,
    user_id     VARCHAR(255),
    processed   BOOLEAN NOT NULL DEFAULT FALSE,
    response    TEXT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_INSIGHTS: &str = r#"
CREATE TABLE IF NOT EXISTS insights (
    id               BIGSERIAL PRIMARY KEY,
    question_id      BIGINT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    title            VARCHAR(200) NOT NULL,
    description      TEXT NOT NULL,
    category         VARCHAR(32) NOT NULL,
    confidence_score DOUBLE PRECISION NOT NULL,
    data_sources     JSONB NOT NULL DEFAULT '[]',
    action_items     JSONB NOT NULL DEFAULT '[]',
    data_evidence    JSONB NOT NULL DEFAULT '[]',
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_INSIGHTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_insights_question_id ON insights (question_id)";

/// Creates the owned tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_QUESTIONS).execute(pool).await?;
    sqlx::query(CREATE_INSIGHTS).execute(pool).await?;
    sqlx::query(CREATE_INSIGHTS_INDEX).execute(pool).await?;
    info!("Metadata schema is in place");
    Ok(())
}
