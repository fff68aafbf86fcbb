use thiserror::Error;

/// Why a watch loop instance terminated.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to open service watch: {0}")]
    StreamOpen(#[source] kube::Error),

    #[error("service watch stream ended")]
    StreamEnded,
}
