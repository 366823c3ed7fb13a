use axum::{
    Extension, Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use super::events::query;
use crate::{
    adapters::http::{app_state::AppState, middleware::TenantContext},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(analytics))
        .route("/stats", get(stats))
}

#[derive(Debug, Default, Deserialize)]
struct AnalyticsQuery {
    project_id: Option<Uuid>,
}

/// GET /api/analytics
async fn analytics(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    q: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let q = query(q)?;
    let report = app_state
        .analytics_use_cases
        .report(tenant.tenant_id, q.project_id)
        .await?;
    Ok(Json(report))
}

/// GET /api/stats
async fn stats(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> AppResult<impl IntoResponse> {
    let stats = app_state
        .analytics_use_cases
        .stats(tenant.tenant_id)
        .await?;
    Ok(Json(stats))
}
