use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::TenantContext},
    app_error::{AppError, AppResult},
    application::use_cases::event::EventQuery,
    domain::entities::event_kind::EventKind,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/event-logs", get(list_activity))
        .route("/event-logs/{id}", get(get_activity).delete(delete_activity))
        .route("/llm-logs", get(list_llm))
        .route("/llm-logs/{id}", get(get_llm).delete(delete_llm))
        .route("/logs", delete(delete_all))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    project: Option<Uuid>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl From<ListQuery> for EventQuery {
    fn from(q: ListQuery) -> Self {
        EventQuery::page(q.project, q.limit, q.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProjectFilter {
    project: Option<Uuid>,
}

pub(super) fn query<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

/// GET /api/event-logs
async fn list_activity(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let q: EventQuery = query(q)?.into();
    let events = app_state
        .event_use_cases
        .list_activity(tenant.tenant_id, &q)
        .await?;
    Ok(Json(events))
}

/// GET /api/llm-logs
async fn list_llm(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    q: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let q: EventQuery = query(q)?.into();
    let events = app_state
        .event_use_cases
        .list_llm(tenant.tenant_id, &q)
        .await?;
    Ok(Json(events))
}

async fn get_activity(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let event = app_state
        .event_use_cases
        .get_activity(tenant.tenant_id, id)
        .await?;
    Ok(Json(event))
}

async fn get_llm(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let event = app_state
        .event_use_cases
        .get_llm(tenant.tenant_id, id)
        .await?;
    Ok(Json(event))
}

async fn delete_activity(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state
        .event_use_cases
        .delete_one(tenant.tenant_id, EventKind::Activity, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_llm(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state
        .event_use_cases
        .delete_one(tenant.tenant_id, EventKind::Llm, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/logs
///
/// Deletes every event of the tenant, or only one project's when `project` is set.
async fn delete_all(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    q: Result<Query<ProjectFilter>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let filter = query(q)?;
    let counts = app_state
        .event_use_cases
        .delete_all(tenant.tenant_id, filter.project)
        .await?;
    Ok(Json(counts))
}
