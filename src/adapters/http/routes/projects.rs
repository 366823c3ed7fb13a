use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::TenantContext},
    app_error::AppResult,
    domain::entities::project_kind::ProjectKind,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/{project_id}", delete(deactivate_project))
}

#[derive(Deserialize)]
struct CreateProjectPayload {
    name: String,
    #[serde(default)]
    kind: ProjectKind,
}

/// GET /api/projects
async fn list_projects(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> AppResult<impl IntoResponse> {
    let projects = app_state
        .project_use_cases
        .list_projects(tenant.tenant_id)
        .await?;
    Ok(Json(projects))
}

/// POST /api/projects
async fn create_project(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<CreateProjectPayload>,
) -> AppResult<impl IntoResponse> {
    let project = app_state
        .project_use_cases
        .create_project(tenant.tenant_id, &payload.name, payload.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// DELETE /api/projects/{project_id}
///
/// Soft delete: the name becomes free again and stored events stay put.
async fn deactivate_project(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(project_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state
        .project_use_cases
        .deactivate_project(tenant.tenant_id, project_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
