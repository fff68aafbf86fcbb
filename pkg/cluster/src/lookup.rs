use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::Api;
use kube::api::ListParams;
use pkg_constants::watch::SERVICE_NAME_LABEL;
use pkg_types::endpoint::ResolvedEndpoint;
use pkg_types::pod::BackingWorkload;

use crate::Result;
use crate::convert::{backing_workload, label_selector, ready_endpoints};

/// Live cluster state needed to translate one Service.
#[async_trait]
pub trait ClusterLookup: Send + Sync {
    /// Ready addresses currently fulfilling the service.
    async fn ready_endpoints(&self, namespace: &str, service: &str)
    -> Result<Vec<ResolvedEndpoint>>;

    /// Pods matched by the service's label selector.
    async fn backing_workloads(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<BackingWorkload>>;
}

/// `ClusterLookup` backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeLookup {
    client: kube::Client,
}

impl KubeLookup {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterLookup for KubeLookup {
    async fn ready_endpoints(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<ResolvedEndpoint>> {
        let api: Api<EndpointSlice> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(&format!("{}={}", SERVICE_NAME_LABEL, service));
        let slices = api.list(&params).await?;
        Ok(ready_endpoints(&slices.items))
    }

    async fn backing_workloads(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<BackingWorkload>> {
        // An empty selector would match every pod in the namespace.
        if selector.is_empty() {
            return Ok(Vec::new());
        }
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(&label_selector(selector));
        let pods = api.list(&params).await?;
        Ok(pods.items.iter().map(backing_workload).collect())
    }
}
