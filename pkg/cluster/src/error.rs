use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("kube error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("in-cluster config error: {0}")]
    InCluster(#[from] kube::config::InClusterError),

    #[error("context switching is not available when running in-cluster")]
    InClusterContextSwitch,

    #[error("other error: {0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
