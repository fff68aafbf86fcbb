//! Conversions from Kubernetes API objects into the translator's input types.

use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use pkg_types::endpoint::ResolvedEndpoint;
use pkg_types::pod::BackingWorkload;
use pkg_types::service::{DeclaredPort, ServiceDefinition, ServiceType, TargetPort};

/// Extract the service definition from a watched object. Objects without a name or
/// namespace do not describe a service and yield `None`.
pub fn service_definition(svc: &Service) -> Option<ServiceDefinition> {
    let name = svc.metadata.name.clone()?;
    let namespace = svc.metadata.namespace.clone()?;
    let spec = svc.spec.clone().unwrap_or_default();

    let ports = spec
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| DeclaredPort {
            name: p.name,
            port: p.port,
            target_port: match p.target_port {
                None => TargetPort::Unset,
                Some(IntOrString::Int(n)) => TargetPort::Number(n),
                Some(IntOrString::String(s)) => TargetPort::Named(s),
            },
            protocol: p.protocol,
        })
        .collect();

    Some(ServiceDefinition {
        name,
        namespace,
        service_type: ServiceType::from_api(spec.type_.as_deref()),
        cluster_ip: spec.cluster_ip,
        ports,
        selector: spec.selector.unwrap_or_default(),
        created_at: svc.creation_timestamp().map(|t| t.0),
    })
}

/// Ready addresses of the given slices. Endpoints whose `ready` condition is
/// explicitly false are skipped; an unknown condition counts as ready.
pub fn ready_endpoints<'a>(
    slices: impl IntoIterator<Item = &'a EndpointSlice>,
) -> Vec<ResolvedEndpoint> {
    let mut resolved = Vec::new();
    for slice in slices {
        for endpoint in &slice.endpoints {
            let ready = endpoint
                .conditions
                .as_ref()
                .and_then(|c| c.ready)
                .unwrap_or(true);
            if !ready {
                continue;
            }
            let pod_name = endpoint
                .target_ref
                .as_ref()
                .filter(|r| r.kind.as_deref().is_none_or(|k| k == "Pod"))
                .and_then(|r| r.name.clone());
            for address in &endpoint.addresses {
                resolved.push(ResolvedEndpoint {
                    address: address.clone(),
                    pod_name: pod_name.clone(),
                    hostname: endpoint.hostname.clone(),
                });
            }
        }
    }
    resolved
}

pub fn backing_workload(pod: &Pod) -> BackingWorkload {
    let status = pod.status.as_ref();
    BackingWorkload {
        name: pod.name_any(),
        running: status.and_then(|s| s.phase.as_deref()) == Some("Running"),
        started_at: status.and_then(|s| s.start_time.as_ref()).map(|t| t.0),
    }
}

/// Render a label selector map as the `k=v,k2=v2` form accepted by list calls.
pub fn label_selector(selector: &std::collections::BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
