//! Network-related constants.

/// Default port for the status HTTP server.
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variable that overrides the listen port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable that overrides the config file path.
pub const CONFIG_ENV: &str = "KUBE_STATUS_CONFIG";
