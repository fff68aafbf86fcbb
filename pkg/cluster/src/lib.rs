//! Access to the Kubernetes cluster: client construction per kubeconfig context,
//! connectivity checks, and the auxiliary lookups used to translate a Service.

pub mod connector;
pub mod convert;
pub mod error;
pub mod lookup;

pub use connector::{ClusterConnector, ContextList, is_running_in_cluster, validate};
pub use error::{Error, Result};
pub use lookup::{ClusterLookup, KubeLookup};
