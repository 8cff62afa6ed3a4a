//! HTTP surface for the pool (§6): the `/burst` miner-ingress endpoint
//! (`getMiningInfo` / `submitNonce`) and a Prometheus `/metrics` exposition
//! endpoint. All pool logic lives in `round-engine`; this crate only
//! translates HTTP to and from `SubmissionPipeline` calls.

pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::{ConfigError, GatewayConfig};
pub use service::ApiGatewayService;
