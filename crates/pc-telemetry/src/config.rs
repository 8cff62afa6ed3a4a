//! Telemetry configuration: the slice of `config.yaml` the pool's logging
//! and metrics setup reads.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// A `tracing_subscriber::EnvFilter` directive string, e.g. `info` or
    /// `pool_core=debug,tower_http=warn`. `RUST_LOG`, when set, still wins.
    pub log_level: String,
    /// Emit logs as single-line JSON instead of the default human format.
    pub json_logs: bool,
    pub service_name: String,
    /// Address the Prometheus `/metrics` exposition endpoint binds to.
    pub metrics_bind_addr: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            service_name: "pool-core".to_string(),
            metrics_bind_addr: "0.0.0.0:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.service_name, "pool-core");
        assert!(!config.json_logs);
    }
}
