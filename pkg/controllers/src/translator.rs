//! Turns a Service definition plus live endpoint/pod lookups into a `ServiceStatus`.

use chrono::{DateTime, Duration, Utc};
use pkg_cluster::ClusterLookup;
use pkg_constants::watch::UPTIME_UNKNOWN;
use pkg_metrics::Metrics;
use pkg_types::endpoint::ResolvedEndpoint;
use pkg_types::pod::{BackingWorkload, oldest_running_start};
use pkg_types::service::{ServiceDefinition, TargetPort};
use pkg_types::status::{EndpointInfo, Health, Protocol, ServicePort, ServiceStatus};
use tracing::warn;

/// Resolve endpoints and backing pods for `def` and build its status record.
///
/// Lookup failures never propagate: the record is built from whatever data was
/// available (yielding `Unhealthy` / `N/A`) and the failure is logged and kept in
/// `last_failure`.
pub async fn translate<L>(def: &ServiceDefinition, lookup: &L, metrics: &Metrics) -> ServiceStatus
where
    L: ClusterLookup + ?Sized,
{
    let (endpoints, workloads) = tokio::join!(
        lookup.ready_endpoints(&def.namespace, &def.name),
        lookup.backing_workloads(&def.namespace, &def.selector),
    );

    let mut failures = Vec::new();
    let endpoints = endpoints.unwrap_or_else(|e| {
        warn!(
            "Error getting endpoints for service {}/{}: {}",
            def.namespace, def.name, e
        );
        metrics.lookup_failures.inc();
        failures.push(format!("endpoints: {}", e));
        Vec::new()
    });
    let workloads = workloads.unwrap_or_else(|e| {
        warn!(
            "Error getting pods for service {}/{}: {}",
            def.namespace, def.name, e
        );
        metrics.lookup_failures.inc();
        failures.push(format!("pods: {}", e));
        Vec::new()
    });

    let last_failure = (!failures.is_empty()).then(|| failures.join("; "));
    build_status(def, &endpoints, &workloads, last_failure, Utc::now())
}

/// Pure part of the translation, evaluated at `now`.
pub fn build_status(
    def: &ServiceDefinition,
    endpoints: &[ResolvedEndpoint],
    workloads: &[BackingWorkload],
    last_failure: Option<String>,
    now: DateTime<Utc>,
) -> ServiceStatus {
    let ports = def
        .ports
        .iter()
        .map(|p| ServicePort {
            name: p.name.clone().filter(|n| !n.is_empty()),
            port: p.port,
            target_port: match &p.target_port {
                TargetPort::Unset => p.port,
                TargetPort::Number(n) => *n,
                TargetPort::Named(_) => 0,
            },
            protocol: p
                .protocol
                .clone()
                .map(Protocol::from)
                .unwrap_or(Protocol::Tcp),
        })
        .collect();

    let endpoints: Vec<EndpointInfo> = endpoints
        .iter()
        .map(|ep| EndpointInfo {
            backing_workload_name: ep.workload_name(),
            address: ep.address.clone(),
        })
        .collect();

    let any_running = workloads.iter().any(|w| w.running);
    let health = if !endpoints.is_empty() && any_running {
        Health::Healthy
    } else {
        Health::Unhealthy
    };

    ServiceStatus {
        name: def.name.clone(),
        namespace: def.namespace.clone(),
        service_type: def.service_type,
        cluster_ip: def.cluster_ip.clone().unwrap_or_default(),
        endpoints,
        ports,
        uptime: uptime(workloads, now),
        last_failure,
        health,
        created_at: def.created_at.unwrap_or(now),
    }
}

/// Time since the oldest running workload started, or `N/A`.
pub fn uptime(workloads: &[BackingWorkload], now: DateTime<Utc>) -> String {
    match oldest_running_start(workloads) {
        Some(started) => format_uptime(now.signed_duration_since(started)),
        None => UPTIME_UNKNOWN.to_string(),
    }
}

/// `{d}d {h}h {m}m`, dropping leading zero units only. Minutes are always shown.
pub fn format_uptime(elapsed: Duration) -> String {
    let total_minutes = elapsed.num_minutes().max(0);
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLookup, make_definition, ready, running_pod};
    use pkg_types::service::DeclaredPort;

    fn web() -> ServiceDefinition {
        make_definition("default", "web")
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::seconds(30)), "0m");
        assert_eq!(format_uptime(Duration::minutes(5)), "5m");
        assert_eq!(format_uptime(Duration::minutes(90)), "1h 30m");
        assert_eq!(format_uptime(Duration::hours(2)), "2h 0m");
        assert_eq!(format_uptime(Duration::hours(25)), "1d 1h 0m");
        assert_eq!(format_uptime(Duration::days(2) + Duration::minutes(7)), "2d 0h 7m");
        assert_eq!(format_uptime(Duration::minutes(-3)), "0m");
    }

    #[test]
    fn test_uptime_uses_oldest_running_pod() {
        let now = Utc::now();
        let workloads = vec![
            running_pod("web-0", now - Duration::minutes(5)),
            running_pod("web-1", now - Duration::minutes(90)),
            BackingWorkload {
                name: "web-crashed".to_string(),
                running: false,
                started_at: Some(now - Duration::days(10)),
            },
        ];
        assert_eq!(uptime(&workloads, now), "1h 30m");
        assert_eq!(uptime(&[], now), "N/A");
    }

    #[test]
    fn test_build_status_healthy_service() {
        let now = Utc::now();
        let status = build_status(
            &web(),
            &[ready("10.0.0.5", Some("web-0"))],
            &[running_pod("web-0", now - Duration::minutes(5))],
            None,
            now,
        );

        assert_eq!(status.name, "web");
        assert_eq!(status.namespace, "default");
        assert_eq!(status.health, Health::Healthy);
        assert_eq!(status.uptime, "5m");
        assert_eq!(
            status.endpoints,
            vec![EndpointInfo {
                backing_workload_name: "web-0".to_string(),
                address: "10.0.0.5".to_string(),
            }]
        );
        assert_eq!(
            status.ports,
            vec![ServicePort {
                name: Some("http".to_string()),
                port: 80,
                target_port: 8080,
                protocol: Protocol::Tcp,
            }]
        );
        assert!(status.last_failure.is_none());
    }

    #[test]
    fn test_health_requires_endpoints_and_running_pod() {
        let now = Utc::now();
        let pod = running_pod("web-0", now - Duration::minutes(5));
        let endpoint = ready("10.0.0.5", Some("web-0"));

        let no_endpoints = build_status(&web(), &[], &[pod.clone()], None, now);
        assert_eq!(no_endpoints.health, Health::Unhealthy);

        let not_running = BackingWorkload {
            running: false,
            ..pod
        };
        let stopped = build_status(&web(), &[endpoint.clone()], &[not_running], None, now);
        assert_eq!(stopped.health, Health::Unhealthy);
        assert_eq!(stopped.uptime, "N/A");

        let no_pods = build_status(&web(), &[endpoint], &[], None, now);
        assert_eq!(no_pods.health, Health::Unhealthy);
    }

    #[test]
    fn test_ports_keep_declaration_order_and_defaults() {
        let mut def = web();
        def.ports = vec![
            DeclaredPort {
                name: Some("dns".to_string()),
                port: 53,
                target_port: TargetPort::Number(5353),
                protocol: Some("UDP".to_string()),
            },
            DeclaredPort {
                name: None,
                port: 9090,
                target_port: TargetPort::Unset,
                protocol: None,
            },
            DeclaredPort {
                name: Some(String::new()),
                port: 443,
                target_port: TargetPort::Named("https".to_string()),
                protocol: Some("SCTP".to_string()),
            },
        ];
        let status = build_status(&def, &[], &[], None, Utc::now());
        let ports: Vec<(Option<&str>, i32, i32, String)> = status
            .ports
            .iter()
            .map(|p| (p.name.as_deref(), p.port, p.target_port, p.protocol.to_string()))
            .collect();
        assert_eq!(
            ports,
            vec![
                (Some("dns"), 53, 5353, "UDP".to_string()),
                (None, 9090, 9090, "TCP".to_string()),
                (None, 443, 0, "SCTP".to_string()),
            ]
        );
    }

    #[test]
    fn test_created_at_falls_back_to_now() {
        let now = Utc::now();
        let mut def = web();
        def.created_at = None;
        assert_eq!(build_status(&def, &[], &[], None, now).created_at, now);
    }

    #[tokio::test]
    async fn test_translate_healthy() {
        let lookup = FakeLookup::new();
        lookup
            .set_endpoints("default", "web", vec![ready("10.0.0.5", Some("web-0"))])
            .await;
        lookup
            .set_workloads(
                "default",
                vec![running_pod("web-0", Utc::now() - Duration::minutes(5))],
            )
            .await;

        let metrics = Metrics::new();
        let status = translate(&web(), &lookup, &metrics).await;
        assert_eq!(status.health, Health::Healthy);
        assert_eq!(status.uptime, "5m");
        assert_eq!(status.endpoints[0].address, "10.0.0.5");
        assert_eq!(metrics.lookup_failures.get(), 0);
    }

    #[tokio::test]
    async fn test_translate_lookup_failure_degrades_record() {
        let lookup = FakeLookup::new();
        lookup
            .set_endpoints("default", "web", vec![ready("10.0.0.5", Some("web-0"))])
            .await;
        lookup.fail_workloads(true).await;

        let metrics = Metrics::new();
        let status = translate(&web(), &lookup, &metrics).await;
        assert_eq!(status.health, Health::Unhealthy);
        assert_eq!(status.uptime, "N/A");
        assert_eq!(status.endpoints.len(), 1);
        assert!(status.last_failure.as_deref().unwrap().starts_with("pods:"));
        assert_eq!(metrics.lookup_failures.get(), 1);
    }
}
