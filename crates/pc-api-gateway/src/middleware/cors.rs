//! CORS layer for the `/burst` and `/metrics` endpoints.

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::config::CorsConfig;

pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = config.allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }
}
