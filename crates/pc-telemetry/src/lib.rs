//! # Telemetry
//!
//! Structured logging (`tracing` + `tracing-subscriber`) and Prometheus
//! metrics for the pool. Shipping logs to an OTLP collector or Loki is out
//! of scope; this crate stops at stdout/stderr and a `/metrics` text
//! exposition, which `node-runtime` wires into the API gateway's router.

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingGuard};
pub use metrics::{encode_metrics, HistogramTimer, PoolMetrics};

use prometheus::Registry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),
}

/// Initializes logging and a fresh metrics registry. Returns the guard
/// (held for the process lifetime) alongside the registry and metrics the
/// rest of the pool records against.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(LoggingGuard, Registry, PoolMetrics), TelemetryError> {
    let guard = init_logging(config)?;
    let registry = Registry::new();
    let metrics = PoolMetrics::new(&registry)?;
    Ok((guard, registry, metrics))
}

/// Creates a span tagged with a pool subsystem name.
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_pool_core() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "pool-core");
    }

    #[test]
    fn init_telemetry_builds_a_clean_registry() {
        let config = TelemetryConfig::default();
        // Logging subscriber installation is process-global and may already
        // be set by another test in this binary; only the metrics side is
        // asserted here.
        let registry = Registry::new();
        let metrics = PoolMetrics::new(&registry).unwrap();
        metrics.blocks_won.inc();
        assert_eq!(metrics.blocks_won.get(), 1.0);
    }
}
