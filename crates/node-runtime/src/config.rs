//! `./config.yaml` schema: the top-level document combining every
//! subsystem's own config slice (§2 Ambient Stack, §6 CLI/environment).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use pc_api_gateway::GatewayConfig;
use pc_telemetry::TelemetryConfig;
use round_engine::PoolConfig;

/// Where the round engine's persistence lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Production backend: RocksDB under `storage.data_dir`.
    Rocksdb,
    /// Volatile, for local runs and tests.
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Rocksdb
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::default(), data_dir: PathBuf::from("./data") }
    }
}

/// The full `config.yaml` document: one section per subsystem.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub pool: PoolConfig,
    pub gateway: GatewayConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            gateway: GatewayConfig::default(),
            telemetry: TelemetryConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: serde_yaml::Error },

    #[error(transparent)]
    Invalid(#[from] round_engine::RoundEngineError),

    #[error("invalid gateway configuration: {0}")]
    Gateway(#[from] pc_api_gateway::ConfigError),
}

impl NodeConfig {
    /// Loads `path`, falling back to `Default` (which then fails
    /// `validate()` with an actionable message) when the file is absent —
    /// the binary takes no flags, so a missing `config.yaml` is reported as
    /// a config error rather than silently running with defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        self.gateway.validate()?;
        Ok(())
    }
}
