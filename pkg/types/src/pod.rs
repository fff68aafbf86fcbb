use chrono::{DateTime, Utc};

/// A pod selected by a Service's label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingWorkload {
    pub name: String,
    /// Pod phase is `Running`.
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
}

/// Start time of the oldest running workload, if any reports one.
pub fn oldest_running_start(workloads: &[BackingWorkload]) -> Option<DateTime<Utc>> {
    workloads
        .iter()
        .filter(|w| w.running)
        .filter_map(|w| w.started_at)
        .min()
}
