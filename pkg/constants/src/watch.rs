//! Watch loop and snapshot broadcaster constants.

/// How often a connected viewer receives a fresh snapshot, in milliseconds.
pub const SNAPSHOT_INTERVAL_MS: u64 = 1000;

/// First delay before restarting a failed watch loop, in milliseconds.
pub const RESTART_BACKOFF_BASE_MS: u64 = 1000;

/// Upper bound for the watch loop restart delay, in milliseconds.
pub const RESTART_BACKOFF_MAX_MS: u64 = 30_000;

/// Label that ties an EndpointSlice to its owning Service.
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

/// Placeholder uptime when no running backing workload reports a start time.
pub const UPTIME_UNKNOWN: &str = "N/A";
