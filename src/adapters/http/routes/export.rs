use axum::{
    Extension, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use super::events::query;
use crate::{
    adapters::http::{app_state::AppState, middleware::TenantContext},
    app_error::AppResult,
    application::use_cases::export::ExportKind,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{kind}", get(export))
}

#[derive(Debug, Default, Deserialize)]
struct ExportQuery {
    project: Option<Uuid>,
    #[serde(default)]
    include_projects: bool,
}

/// GET /api/export/{kind}
async fn export(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(kind): Path<String>,
    q: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let kind: ExportKind = kind.parse()?;
    let q = query(q)?;

    let export = app_state
        .export_use_cases
        .export(tenant.tenant_id, kind, q.project, q.include_projects)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}
