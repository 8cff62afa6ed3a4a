//! Domain types for the API Gateway: configuration and wire-error rendering.

pub mod config;
pub mod error;

pub use config::{ConfigError, GatewayConfig};
pub use error::{render_error, WireError};
