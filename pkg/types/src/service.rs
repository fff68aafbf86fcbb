use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
    ExternalName,
}

impl ServiceType {
    /// Parse the type string of a cluster Service. Unknown or absent types fall back to `ClusterIP`.
    pub fn from_api(value: Option<&str>) -> Self {
        match value {
            Some("NodePort") => ServiceType::NodePort,
            Some("LoadBalancer") => ServiceType::LoadBalancer,
            Some("ExternalName") => ServiceType::ExternalName,
            _ => ServiceType::ClusterIP,
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::ClusterIP => write!(f, "ClusterIP"),
            ServiceType::NodePort => write!(f, "NodePort"),
            ServiceType::LoadBalancer => write!(f, "LoadBalancer"),
            ServiceType::ExternalName => write!(f, "ExternalName"),
        }
    }
}

/// Target of a declared service port as written in the Service spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPort {
    /// Not set; the cluster defaults it to the service port.
    Unset,
    Number(i32),
    /// Named container port. Not resolved against pods.
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredPort {
    pub name: Option<String>,
    pub port: i32,
    pub target_port: TargetPort,
    pub protocol: Option<String>,
}

/// The parts of a cluster Service the translator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub name: String,
    pub namespace: String,
    pub service_type: ServiceType,
    pub cluster_ip: Option<String>,
    pub ports: Vec<DeclaredPort>,
    /// Label selector for backing pods. Empty means the service selects nothing.
    pub selector: BTreeMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
}
