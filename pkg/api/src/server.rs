use axum::{
    Router, middleware,
    routing::{get, post},
};
use pkg_cluster::{ClusterConnector, validate};
use pkg_constants::watch::SNAPSHOT_INTERVAL_MS;
use pkg_controllers::WatchSupervisor;
use pkg_metrics::Metrics;
use pkg_state::StatusStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::AppState;
use crate::handlers::{contexts, health, services, stream};
use crate::request_log::request_log_middleware;

/// Server configuration passed from the binary's CLI.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/services", get(services::list_services))
        .route("/api/contexts", get(contexts::list_contexts))
        .route("/api/contexts/switch", post(contexts::switch_context))
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(health::metrics))
        .route_layer(middleware::from_fn(request_log_middleware));

    Router::new()
        .route("/ws", get(stream::stream_services))
        .merge(api_routes)
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let connector = ClusterConnector::detect(config.kubeconfig);
    let context = if connector.in_cluster() {
        if let Some(ctx) = &config.context {
            warn!("Ignoring context {} when running in-cluster", ctx);
        }
        None
    } else {
        config
            .context
            .or_else(|| connector.contexts().ok().and_then(|list| list.current))
    };

    let client = connector.connect(context.as_deref()).await?;
    match validate(&client).await {
        Ok(version) => info!("Connected to the cluster: {} | {}", context.as_deref().unwrap_or("in-cluster"), version),
        Err(e) => warn!("API server not reachable yet ({}); the watch will keep retrying", e),
    }

    let store = StatusStore::new();
    let metrics = Arc::new(Metrics::new());
    let supervisor = Arc::new(WatchSupervisor::new(
        store.clone(),
        connector,
        metrics.clone(),
    ));
    supervisor.start(client, context).await;

    let state = AppState {
        store,
        supervisor: supervisor.clone(),
        metrics,
        snapshot_interval: Duration::from_millis(SNAPSHOT_INTERVAL_MS),
    };

    info!("Starting API server on {}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
