//! Watch loop: one subscription to Service changes, feeding the translator and the store.

use std::collections::HashSet;
use std::pin::pin;
use std::sync::Arc;

use futures_util::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::api::ListParams;
use kube::runtime::{WatchStreamExt, watcher};
use kube::{Api, ResourceExt};
use pkg_cluster::convert::service_definition;
use pkg_cluster::{ClusterLookup, KubeLookup};
use pkg_metrics::Metrics;
use pkg_state::{Generation, StatusStore};
use pkg_types::status::ServiceKey;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::WatchError;
use crate::translator::translate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchState {
    Disconnected,
    Connecting,
    Streaming,
}

impl std::fmt::Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchState::Disconnected => write!(f, "Disconnected"),
            WatchState::Connecting => write!(f, "Connecting"),
            WatchState::Streaming => write!(f, "Streaming"),
        }
    }
}

/// Observable state of the current watch loop generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchStatus {
    pub state: WatchState,
    pub generation: Generation,
    pub context: Option<String>,
}

/// Applies watch notifications to the store on behalf of one generation.
pub struct EventHandler<L> {
    lookup: L,
    store: StatusStore,
    generation: Generation,
    metrics: Arc<Metrics>,
    /// Keys seen since the last `Init`, while a relist is in progress.
    relist: Option<HashSet<ServiceKey>>,
}

impl<L: ClusterLookup> EventHandler<L> {
    pub fn new(lookup: L, store: StatusStore, generation: Generation, metrics: Arc<Metrics>) -> Self {
        Self {
            lookup,
            store,
            generation,
            metrics,
            relist: None,
        }
    }

    /// Apply one notification. Returns `false` once this generation has been
    /// superseded and the caller should stop.
    pub async fn handle(&mut self, event: watcher::Event<Service>) -> bool {
        self.metrics.watch_events.inc();
        let current = match event {
            watcher::Event::Apply(svc) | watcher::Event::InitApply(svc) => self.apply(&svc).await,
            watcher::Event::Delete(svc) => self.delete(&svc).await,
            watcher::Event::Init => {
                debug!("Service relist started (generation {})", self.generation);
                self.relist = Some(HashSet::new());
                true
            }
            watcher::Event::InitDone => self.finish_relist().await,
        };
        if current {
            self.metrics.services.set(self.store.len().await as i64);
        }
        current
    }

    async fn apply(&mut self, svc: &Service) -> bool {
        let Some(def) = service_definition(svc) else {
            debug!("Ignoring watch payload that does not describe a service");
            return true;
        };
        let status = translate(&def, &self.lookup, &self.metrics).await;
        if let Some(seen) = self.relist.as_mut() {
            seen.insert(status.key());
        }
        debug!(
            "Service {}/{}: {} ({} endpoints, uptime {})",
            status.namespace,
            status.name,
            status.health,
            status.endpoints.len(),
            status.uptime
        );
        self.store.upsert(self.generation, status).await
    }

    async fn delete(&mut self, svc: &Service) -> bool {
        let Some(namespace) = svc.namespace() else {
            return true;
        };
        let key = ServiceKey::new(namespace, svc.name_any());
        if self.store.remove(self.generation, &key).await {
            info!("Service {} deleted", key);
        }
        self.is_current().await
    }

    async fn finish_relist(&mut self) -> bool {
        let Some(seen) = self.relist.take() else {
            return true;
        };
        let removed = self.store.retain(self.generation, &seen).await;
        if removed > 0 {
            info!("Relist pruned {} services that no longer exist", removed);
        }
        self.is_current().await
    }

    async fn is_current(&self) -> bool {
        self.store.generation().await == self.generation
    }
}

/// One watch loop instance. Created fresh for every (re)start; `run` consumes it.
pub struct ServiceWatcher {
    api: Api<Service>,
    handler: EventHandler<KubeLookup>,
    generation: Generation,
    status: watch::Sender<WatchStatus>,
}

impl ServiceWatcher {
    pub fn new(
        client: kube::Client,
        generation: Generation,
        store: StatusStore,
        metrics: Arc<Metrics>,
        status: watch::Sender<WatchStatus>,
    ) -> Self {
        Self {
            api: Api::all(client.clone()),
            handler: EventHandler::new(KubeLookup::new(client), store, generation, metrics),
            generation,
            status,
        }
    }

    fn set_state(&self, state: WatchState) {
        let generation = self.generation;
        self.status.send_if_modified(|s| {
            if s.generation != generation || s.state == state {
                return false;
            }
            s.state = state;
            true
        });
    }

    /// Stream Service notifications into the store until the stream fails.
    ///
    /// Returns `Ok(())` only when a newer generation took over the store.
    pub async fn run(mut self) -> Result<(), WatchError> {
        self.set_state(WatchState::Connecting);
        info!("Opening service watch (generation {})", self.generation);

        if let Err(e) = self.api.list(&ListParams::default().limit(1)).await {
            self.set_state(WatchState::Disconnected);
            return Err(WatchError::StreamOpen(e));
        }
        self.set_state(WatchState::Streaming);
        info!("Service watch streaming (generation {})", self.generation);

        let stream = watcher(self.api.clone(), watcher::Config::default()).default_backoff();
        let mut stream = pin!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    if !self.handler.handle(event).await {
                        info!(
                            "Watch generation {} superseded, stopping",
                            self.generation
                        );
                        return Ok(());
                    }
                }
                Err(e) => warn!("Transient service watch error: {}", e),
            }
        }

        self.set_state(WatchState::Disconnected);
        Err(WatchError::StreamEnded)
    }
}
