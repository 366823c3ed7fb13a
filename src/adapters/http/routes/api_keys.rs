use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::TenantContext},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_api_keys).post(create_api_key))
        .route("/{key_id}", delete(deactivate_api_key))
}

#[derive(Deserialize)]
struct CreateApiKeyPayload {
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateApiKeyResponse {
    id: Uuid,
    /// Shown once; only the hash is stored.
    key: String,
    key_prefix: String,
    name: String,
    created_at: NaiveDateTime,
}

/// GET /api/api-keys
async fn list_api_keys(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> AppResult<impl IntoResponse> {
    let keys = app_state
        .api_key_use_cases
        .list_api_keys(tenant.tenant_id)
        .await?;
    Ok(Json(keys))
}

/// POST /api/api-keys
async fn create_api_key(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<CreateApiKeyPayload>,
) -> AppResult<impl IntoResponse> {
    let name = payload.name.as_deref().unwrap_or("Default");

    let (profile, raw_key) = app_state
        .api_key_use_cases
        .create_api_key(tenant.tenant_id, name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateApiKeyResponse {
            id: profile.id,
            key: raw_key,
            key_prefix: profile.key_prefix,
            name: profile.name,
            created_at: profile.created_at,
        }),
    ))
}

/// DELETE /api/api-keys/{key_id}
async fn deactivate_api_key(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(key_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state
        .api_key_use_cases
        .deactivate_api_key(tenant.tenant_id, key_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
