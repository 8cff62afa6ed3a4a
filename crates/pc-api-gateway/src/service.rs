//! Gateway service bootstrap: binds the `/burst` and `/metrics` HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use round_engine::SubmissionPipeline;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::config::GatewayConfig;
use crate::domain::error::ConfigError;
use crate::middleware::create_cors_layer;
use crate::router::{burst_get, burst_post, metrics, AppState};

pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    pub fn new(
        config: GatewayConfig,
        submission_pipeline: Arc<SubmissionPipeline>,
        metrics_registry: Arc<Registry>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, state: AppState { submission_pipeline, metrics_registry } })
    }

    fn router(&self) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(self.config.request_timeout));

        Router::new()
            .route("/burst", get(burst_get).post(burst_post))
            .route("/metrics", get(metrics))
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Binds and serves until the process is terminated. `node-runtime` races
    /// this against its own `ctrl_c` listener.
    pub async fn serve(&self) -> std::io::Result<()> {
        let addr = self.config.bind_addr();
        info!(%addr, "starting pool HTTP gateway");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router().into_make_service_with_connect_info::<SocketAddr>()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_rejects_port_zero() {
        let config = GatewayConfig { port: 0, ..GatewayConfig::default() };
        assert!(config.validate().is_err());
    }
}
