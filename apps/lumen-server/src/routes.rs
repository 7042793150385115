//! HTTP routes: the one processing operation plus secondary reads.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use lumen_core::{AppError, ErrorKind};

use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/queries/process", post(process_query))
        .route("/api/queries", get(list_questions))
        .route("/api/queries/:id", get(get_question))
        .route("/api/queries/:id/insights", get(get_insights))
        .route("/api/stats/cache", get(cache_stats))
        .route("/api/stats/cost", get(cost_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ProcessQueryRequest {
    query_text: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default)]
    offset: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    20
}

struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = json!({
            "success": false,
            "error": {
                "kind": self.0.kind,
                "message": self.0.message,
            }
        });
        (status, Json(body)).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<ProcessQueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let envelope = state
        .pipeline
        .process(&request.query_text, request.user_id.as_deref())
        .await?;
    Ok(Json(envelope))
}

async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.pipeline.question(id).await? {
        Some(question) => Ok(Json(question).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": {"kind": "not_found", "message": format!("question {id} not found")}
            })),
        )
            .into_response()),
    }
}

async fn list_questions(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let questions = state.pipeline.questions(page.offset, page.limit).await?;
    Ok(Json(json!({ "questions": questions })))
}

async fn get_insights(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let insights = state.pipeline.insights_for(id).await?;
    Ok(Json(json!({ "insights": insights })))
}

async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.cache_stats())
}

async fn cost_summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.cost_summary())
}
