//! # Pool-Core Node Runtime
//!
//! Entry point for the mining pool server. Loads `./config.yaml`, wires the
//! round engine and HTTP gateway, then races the gateway's `serve()` future
//! against a `ctrl_c` listener for graceful shutdown (§6).
//!
//! Exit codes: `0` on clean shutdown, `1` on fatal configuration error, `2`
//! on initial wallet failure, `3` on any other startup failure (storage open,
//! gateway bind).

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use node_runtime::{wiring, NodeConfig, WiringError};
use tracing::{error, info};

const CONFIG_PATH: &str = "./config.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match NodeConfig::load(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(e) => {
            // Logging isn't initialized yet without a parsed TelemetryConfig;
            // a config-load failure is reported on stderr directly.
            eprintln!("fatal: invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let (_logging_guard, registry, metrics) = match pc_telemetry::init_telemetry(&config.telemetry) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("fatal: failed to initialize telemetry: {e}");
            return ExitCode::from(1);
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "starting pool-core");

    let process = match wiring::build(&config, Arc::new(metrics), Arc::new(registry)).await {
        Ok(process) => process,
        Err(WiringError::Wallet(e)) => {
            error!(error = %e, "initial wallet check failed");
            return ExitCode::from(2);
        }
        Err(e) => {
            error!(error = %e, "failed to wire the pool");
            return ExitCode::from(3);
        }
    };

    let background_tasks = process.core.spawn_background_tasks();

    info!("pool-core ready");
    tokio::select! {
        result = process.gateway.serve() => {
            if let Err(e) = result {
                error!(error = %e, "gateway server exited with an error");
                return ExitCode::from(3);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    process.core.shutdown();
    for handle in background_tasks {
        let _ = handle.await;
    }

    info!("pool-core shut down cleanly");
    ExitCode::SUCCESS
}
