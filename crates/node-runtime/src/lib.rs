//! # Node Runtime
//!
//! The pool's process shell: loads `./config.yaml`, wires storage, the
//! wallet client, and the deadline kernel into a `round_engine::PoolCore`,
//! and serves the `pc-api-gateway` HTTP surface alongside it. The binary
//! entry point is `main.rs`; this library exposes the same pieces for
//! integration tests.

pub mod config;
pub mod wiring;

pub use config::{ConfigError, NodeConfig, StorageBackend, StorageConfig};
pub use wiring::{build, PoolProcess, WiringError};
