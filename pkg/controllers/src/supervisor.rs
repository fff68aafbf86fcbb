//! Owns the lifetime of the watch loop: restarts it with backoff and swaps it out
//! when the active cluster connection changes.

use std::sync::Arc;
use std::time::Duration;

use pkg_cluster::{ClusterConnector, validate};
use pkg_constants::watch::{RESTART_BACKOFF_BASE_MS, RESTART_BACKOFF_MAX_MS};
use pkg_metrics::Metrics;
use pkg_state::{Generation, StatusStore};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::backoff::Backoff;
use crate::error::WatchError;
use crate::watcher::{ServiceWatcher, WatchState, WatchStatus};

/// Result of a successful connection switch.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchOutcome {
    pub context: String,
    pub version: String,
    pub generation: Generation,
}

struct ActiveWatch {
    generation: Generation,
    handle: JoinHandle<()>,
}

/// Runs exactly one watch loop generation at a time against the active cluster.
pub struct WatchSupervisor {
    store: StatusStore,
    connector: ClusterConnector,
    metrics: Arc<Metrics>,
    status: watch::Sender<WatchStatus>,
    /// Held for the whole swap so concurrent switches are serialized.
    active: Mutex<Option<ActiveWatch>>,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl WatchSupervisor {
    pub fn new(store: StatusStore, connector: ClusterConnector, metrics: Arc<Metrics>) -> Self {
        let (status, _) = watch::channel(WatchStatus {
            state: WatchState::Disconnected,
            generation: 0,
            context: None,
        });
        Self {
            store,
            connector,
            metrics,
            status,
            active: Mutex::new(None),
            backoff_base: Duration::from_millis(RESTART_BACKOFF_BASE_MS),
            backoff_max: Duration::from_millis(RESTART_BACKOFF_MAX_MS),
        }
    }

    pub fn connector(&self) -> &ClusterConnector {
        &self.connector
    }

    pub fn status(&self) -> WatchStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WatchStatus> {
        self.status.subscribe()
    }

    /// Replace any running loop with a new generation watching through `client`.
    pub async fn start(&self, client: kube::Client, context: Option<String>) -> Generation {
        let mut active = self.active.lock().await;
        self.replace(&mut active, client, context).await
    }

    /// Connect to `context`, verify the API server answers, then hand the store to a
    /// new watch loop. On failure nothing changes and the previous loop keeps running.
    pub async fn switch_context(&self, context: &str) -> pkg_cluster::Result<SwitchOutcome> {
        let client = self.connector.connect(Some(context)).await?;
        let version = validate(&client).await?;
        info!("Connected to cluster context {} ({})", context, version);

        let mut active = self.active.lock().await;
        let generation = self
            .replace(&mut active, client, Some(context.to_string()))
            .await;
        Ok(SwitchOutcome {
            context: context.to_string(),
            version,
            generation,
        })
    }

    /// Stop the running loop, if any.
    pub async fn shutdown(&self) {
        if let Some(prev) = self.active.lock().await.take() {
            info!("Stopping watch generation {}", prev.generation);
            prev.handle.abort();
        }
    }

    async fn replace(
        &self,
        active: &mut Option<ActiveWatch>,
        client: kube::Client,
        context: Option<String>,
    ) -> Generation {
        if let Some(prev) = active.take() {
            info!("Stopping watch generation {}", prev.generation);
            prev.handle.abort();
        }

        // Advancing the generation fences off any write still in flight from the old loop.
        let generation = self.store.advance_generation().await;
        self.status.send_replace(WatchStatus {
            state: WatchState::Disconnected,
            generation,
            context,
        });

        let handle = tokio::spawn(supervise(
            client,
            generation,
            self.store.clone(),
            self.metrics.clone(),
            self.status.clone(),
            Backoff::new(self.backoff_base, self.backoff_max),
        ));
        *active = Some(ActiveWatch { generation, handle });
        generation
    }
}

/// Keep one generation's watch loop alive until it is superseded.
async fn supervise(
    client: kube::Client,
    generation: Generation,
    store: StatusStore,
    metrics: Arc<Metrics>,
    status: watch::Sender<WatchStatus>,
    mut backoff: Backoff,
) {
    loop {
        let watcher = ServiceWatcher::new(
            client.clone(),
            generation,
            store.clone(),
            metrics.clone(),
            status.clone(),
        );
        match watcher.run().await {
            Ok(()) => return,
            Err(WatchError::StreamEnded) => {
                warn!("Service watch stream ended (generation {})", generation);
                backoff.reset();
            }
            Err(e) => error!("Service watch failed (generation {}): {}", generation, e),
        }

        metrics.watch_restarts.inc();
        let delay = backoff.next_delay();
        info!("Restarting service watch in {}ms", delay.as_millis());
        tokio::time::sleep(delay).await;

        if store.generation().await != generation {
            info!("Watch generation {} superseded, not restarting", generation);
            return;
        }
    }
}
