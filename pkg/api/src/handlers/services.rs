use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::AppState;

/// GET /api/services: current snapshot grouped by namespace.
pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    let groups = state.store.snapshot().await;
    debug!("Serving service list ({} namespaces)", groups.len());
    (StatusCode::OK, Json(groups))
}
