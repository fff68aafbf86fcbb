use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use pkg_types::validate::validate_context_name;
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;

const IN_CLUSTER_MESSAGE: &str = "Context switching is not available when running in-cluster";

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub context: String,
}

/// GET /api/contexts: kubeconfig contexts and the current one.
pub async fn list_contexts(State(state): State<AppState>) -> impl IntoResponse {
    let connector = state.supervisor.connector();
    if connector.in_cluster() {
        return (StatusCode::BAD_REQUEST, IN_CLUSTER_MESSAGE).into_response();
    }
    match connector.contexts() {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => {
            warn!("Failed to load kubeconfig: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load kubeconfig").into_response()
        }
    }
}

/// POST /api/contexts/switch: connect to another context and restart the watch.
pub async fn switch_context(
    State(state): State<AppState>,
    body: Result<Json<ContextRequest>, JsonRejection>,
) -> impl IntoResponse {
    if state.supervisor.connector().in_cluster() {
        return (StatusCode::BAD_REQUEST, IN_CLUSTER_MESSAGE).into_response();
    }
    let Ok(Json(req)) = body else {
        return (StatusCode::BAD_REQUEST, "Invalid request body").into_response();
    };
    if let Err(e) = validate_context_name(&req.context) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    match state.supervisor.switch_context(&req.context).await {
        Ok(outcome) => {
            info!(
                "Switched to context {} (generation {})",
                outcome.context, outcome.generation
            );
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(pkg_cluster::Error::InClusterContextSwitch) => {
            (StatusCode::BAD_REQUEST, IN_CLUSTER_MESSAGE).into_response()
        }
        Err(e) => {
            warn!("Context switch to {} failed: {}", req.context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
