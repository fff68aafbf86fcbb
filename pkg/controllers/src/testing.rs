//! In-memory `ClusterLookup` for controller tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pkg_cluster::{ClusterLookup, Error, Result};
use pkg_types::endpoint::ResolvedEndpoint;
use pkg_types::pod::BackingWorkload;
use pkg_types::service::{DeclaredPort, ServiceDefinition, ServiceType, TargetPort};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct FakeState {
    /// (namespace, service) -> ready endpoints
    endpoints: HashMap<(String, String), Vec<ResolvedEndpoint>>,
    /// namespace -> pods (selectors are not evaluated)
    workloads: HashMap<String, Vec<BackingWorkload>>,
    fail_endpoints: bool,
    fail_workloads: bool,
}

#[derive(Clone, Default)]
pub struct FakeLookup {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_endpoints(&self, namespace: &str, service: &str, eps: Vec<ResolvedEndpoint>) {
        self.state
            .lock()
            .await
            .endpoints
            .insert((namespace.to_string(), service.to_string()), eps);
    }

    pub async fn set_workloads(&self, namespace: &str, pods: Vec<BackingWorkload>) {
        self.state
            .lock()
            .await
            .workloads
            .insert(namespace.to_string(), pods);
    }

    pub async fn fail_endpoints(&self, fail: bool) {
        self.state.lock().await.fail_endpoints = fail;
    }

    pub async fn fail_workloads(&self, fail: bool) {
        self.state.lock().await.fail_workloads = fail;
    }
}

#[async_trait]
impl ClusterLookup for FakeLookup {
    async fn ready_endpoints(&self, namespace: &str, service: &str) -> Result<Vec<ResolvedEndpoint>> {
        let state = self.state.lock().await;
        if state.fail_endpoints {
            return Err(Error::Other("endpointslices unavailable".into()));
        }
        Ok(state
            .endpoints
            .get(&(namespace.to_string(), service.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn backing_workloads(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<BackingWorkload>> {
        let state = self.state.lock().await;
        if state.fail_workloads {
            return Err(Error::Other("pods unavailable".into()));
        }
        if selector.is_empty() {
            return Ok(Vec::new());
        }
        Ok(state.workloads.get(namespace).cloned().unwrap_or_default())
    }
}

pub fn make_definition(namespace: &str, name: &str) -> ServiceDefinition {
    ServiceDefinition {
        name: name.to_string(),
        namespace: namespace.to_string(),
        service_type: ServiceType::ClusterIP,
        cluster_ip: Some("10.96.0.10".to_string()),
        ports: vec![DeclaredPort {
            name: Some("http".to_string()),
            port: 80,
            target_port: TargetPort::Number(8080),
            protocol: Some("TCP".to_string()),
        }],
        selector: BTreeMap::from([("app".to_string(), name.to_string())]),
        created_at: Some(Utc::now()),
    }
}

pub fn ready(address: &str, pod: Option<&str>) -> ResolvedEndpoint {
    ResolvedEndpoint {
        address: address.to_string(),
        pod_name: pod.map(str::to_string),
        hostname: None,
    }
}

pub fn running_pod(name: &str, started_at: DateTime<Utc>) -> BackingWorkload {
    BackingWorkload {
        name: name.to_string(),
        running: true,
        started_at: Some(started_at),
    }
}
