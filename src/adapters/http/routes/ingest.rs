use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::{Value, json};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::use_cases::{
        api_key::hash_api_key,
        ingest::{ActivityEventPayload, LlmEventPayload},
    },
};

/// Public ingestion endpoints, authenticated by the API key in the body.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/event-log", post(ingest_activity))
        .route("/llm-log", post(ingest_llm))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(p)| p)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

/// Per-key budget. Requests without a key are left for validation to reject.
async fn check_key_budget(app_state: &AppState, api_key: Option<&Value>) -> AppResult<()> {
    if let Some(key) = api_key
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        app_state
            .rate_limiter
            .check_api_key(&hash_api_key(key))
            .await?;
    }
    Ok(())
}

/// POST /api/event-log
async fn ingest_activity(
    State(app_state): State<AppState>,
    payload: Result<Json<ActivityEventPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let payload = body(payload)?;
    check_key_budget(&app_state, payload.api_key.as_ref()).await?;

    app_state.ingest_use_cases.ingest_activity(payload).await?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "success" }))))
}

/// POST /api/llm-log
async fn ingest_llm(
    State(app_state): State<AppState>,
    payload: Result<Json<LlmEventPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let payload = body(payload)?;
    check_key_budget(&app_state, payload.api_key.as_ref()).await?;

    app_state.ingest_use_cases.ingest_llm(payload).await?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "success" }))))
}
