use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::service::ServiceType;

/// Transport protocol of a service port. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
    Other(String),
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        match value.as_str() {
            "TCP" => Protocol::Tcp,
            "UDP" => Protocol::Udp,
            "SCTP" => Protocol::Sctp,
            _ => Protocol::Other(value),
        }
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Sctp => write!(f, "SCTP"),
            Protocol::Other(p) => write!(f, "{}", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub port: i32,
    pub target_port: i32,
    pub protocol: Protocol,
}

/// One reachable address backing a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInfo {
    pub backing_workload_name: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Health::Healthy => write!(f, "Healthy"),
            Health::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Identity of a status record: services are unique per namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceKey {
    pub namespace: String,
    pub name: String,
}

impl ServiceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Latest observed status of one service, rebuilt in full on every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(rename = "clusterIP")]
    pub cluster_ip: String,
    pub endpoints: Vec<EndpointInfo>,
    pub ports: Vec<ServicePort>,
    pub uptime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<String>,
    pub health: Health,
    pub created_at: DateTime<Utc>,
}

impl ServiceStatus {
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(&self.namespace, &self.name)
    }
}

/// Services of one namespace, sorted by name. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceGroup {
    pub namespace: String,
    pub services: Vec<ServiceStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ServiceStatus {
        ServiceStatus {
            name: "web".to_string(),
            namespace: "default".to_string(),
            service_type: ServiceType::NodePort,
            cluster_ip: "10.96.0.12".to_string(),
            endpoints: vec![EndpointInfo {
                backing_workload_name: "web-7d9f".to_string(),
                address: "10.0.0.5".to_string(),
            }],
            ports: vec![ServicePort {
                name: Some("http".to_string()),
                port: 80,
                target_port: 8080,
                protocol: Protocol::Tcp,
            }],
            uptime: "5m".to_string(),
            last_failure: None,
            health: Health::Healthy,
            created_at: "2026-01-02T03:04:05Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_status_wire_format() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "web",
                "namespace": "default",
                "type": "NodePort",
                "clusterIP": "10.96.0.12",
                "endpoints": [{"backingWorkloadName": "web-7d9f", "address": "10.0.0.5"}],
                "ports": [{"name": "http", "port": 80, "targetPort": 8080, "protocol": "TCP"}],
                "uptime": "5m",
                "health": "Healthy",
                "createdAt": "2026-01-02T03:04:05Z"
            })
        );
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut status = sample();
        status.ports[0].name = None;
        status.last_failure = Some("endpoint lookup failed".to_string());
        let value = serde_json::to_value(&status).unwrap();
        assert!(value["ports"][0].get("name").is_none());
        assert_eq!(value["lastFailure"], "endpoint lookup failed");
    }

    #[test]
    fn test_protocol_keeps_unknown_values() {
        assert_eq!(Protocol::from("UDP".to_string()), Protocol::Udp);
        let other = Protocol::from("QUIC".to_string());
        assert_eq!(other, Protocol::Other("QUIC".to_string()));
        assert_eq!(serde_json::to_value(&other).unwrap(), json!("QUIC"));
    }

    #[test]
    fn test_service_key_orders_by_namespace_first() {
        let a = ServiceKey::new("alpha", "zeta");
        let b = ServiceKey::new("beta", "api");
        assert!(a < b);
        assert_eq!(b.to_string(), "beta/api");
    }
}
