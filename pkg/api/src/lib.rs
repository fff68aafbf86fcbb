pub mod handlers;
pub mod request_log;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use pkg_controllers::WatchSupervisor;
use pkg_metrics::Metrics;
use pkg_state::StatusStore;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: StatusStore,
    pub supervisor: Arc<WatchSupervisor>,
    pub metrics: Arc<Metrics>,
    /// Push cadence of the snapshot broadcaster.
    pub snapshot_interval: Duration,
}
