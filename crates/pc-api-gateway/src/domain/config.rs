//! Gateway configuration: the HTTP-surface slice of `config.yaml`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP gateway configuration (§6 miner ingress + metrics exposition).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address for the `/burst` miner-ingress endpoint.
    pub host: IpAddr,
    pub port: u16,
    /// Request timeout; the deadline kernel's own 2s per-batch timeout
    /// bounds `submitNonce` latency well inside this.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8124,
            request_timeout: Duration::from_secs(10),
            cors: CorsConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port can't be 0".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout can't be 0".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// CORS configuration, permissive by default since miner software is a
/// plain HTTP client, not a browser — mirrors the shape of a browser-facing
/// dashboard that might sit in front of this in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true, allowed_origins: vec!["*".to_string()] }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid gateway configuration: {0}")]
    Invalid(String),
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.trim();
        let secs = s.strip_suffix('s').unwrap_or(s);
        secs.trim().parse::<u64>().map(Duration::from_secs).map_err(serde::de::Error::custom)
    }
}
