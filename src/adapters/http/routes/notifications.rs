use axum::{Extension, Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::{
    adapters::http::{app_state::AppState, middleware::TenantContext},
    app_error::AppResult,
    application::use_cases::notification::NotificationPreferenceInput,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_preference).put(put_preference))
}

/// GET /api/notification-preferences
///
/// `null` until the tenant saves one.
async fn get_preference(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> AppResult<impl IntoResponse> {
    let preference = app_state
        .notification_use_cases
        .get_preference(tenant.tenant_id)
        .await?;
    Ok(Json(preference))
}

/// PUT /api/notification-preferences
async fn put_preference(
    State(app_state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<NotificationPreferenceInput>,
) -> AppResult<impl IntoResponse> {
    let preference = app_state
        .notification_use_cases
        .upsert_preference(tenant.tenant_id, payload)
        .await?;
    Ok(Json(preference))
}
