pub mod analytics;
pub mod api_keys;
pub mod events;
pub mod export;
pub mod ingest;
pub mod notifications;
pub mod projects;

use axum::{Router, middleware};

use crate::adapters::http::{app_state::AppState, middleware::tenant_auth};

/// Dashboard routes, all behind tenant authentication.
pub fn tenant_router() -> Router<AppState> {
    Router::new()
        .nest("/api-keys", api_keys::router())
        .nest("/projects", projects::router())
        .merge(events::router())
        .merge(analytics::router())
        .nest("/export", export::router())
        .nest("/notification-preferences", notifications::router())
}

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new().merge(ingest::router()).merge(
        tenant_router().route_layer(middleware::from_fn_with_state(app_state, tenant_auth)),
    )
}
