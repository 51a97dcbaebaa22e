//! Configuration types.

use std::time::Duration;

/// Service configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the local database file.
    pub db_path: String,
    /// HTTP listen port.
    pub port: u16,
    /// Auto-dispatch sweep interval. `None` disables the sweep loop.
    pub sweep_interval: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/mediflow.db".to_string(),
            port: 8080,
            sweep_interval: None,
        }
    }
}

impl ServiceConfig {
    /// Build from environment variables, falling back to defaults:
    /// `MEDIFLOW_DB_PATH`, `MEDIFLOW_PORT`, `MEDIFLOW_SWEEP_INTERVAL_SECS`
    /// (0 or unset disables the sweep loop).
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("MEDIFLOW_DB_PATH").unwrap_or(defaults.db_path);

        let port = std::env::var("MEDIFLOW_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let sweep_interval = std::env::var("MEDIFLOW_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        Self {
            db_path,
            port,
            sweep_interval,
        }
    }
}
