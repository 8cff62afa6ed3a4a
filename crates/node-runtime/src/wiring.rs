//! Wires a loaded `NodeConfig` into a running `PoolCore` + `ApiGatewayService`.

use std::sync::Arc;
use std::time::Duration;

use pc_api_gateway::ApiGatewayService;
use pc_deadline_kernel::BatchDispatcher;
use pc_storage::{InMemoryKVStore, Repository, StoragePort};
use pc_wallet_client::{HttpWalletTransport, WalletClient, WalletPort, WalletTransport};
use prometheus::Registry;
use round_engine::PoolCore;
use shared_bus::InMemoryEventBus;
use tracing::info;

use crate::config::{NodeConfig, StorageBackend};

#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("failed to open storage at {path}: {source}")]
    Storage { path: String, source: pc_storage::KVStoreError },

    #[error("initial wallet check failed: {0}")]
    Wallet(#[from] shared_types::WalletError),

    #[error(transparent)]
    Gateway(#[from] pc_api_gateway::ConfigError),
}

/// The fully wired pool: `PoolCore` plus the HTTP gateway sitting in front
/// of its `SubmissionPipeline`, and the metrics registry they share.
pub struct PoolProcess {
    pub core: PoolCore,
    pub gateway: ApiGatewayService,
}

/// Builds storage, the wallet client, and the deadline kernel from
/// `config`, confirms at least one wallet answers, then constructs
/// `PoolCore` and `ApiGatewayService`. Does not start any background task or
/// bind any socket — that's `PoolCore::spawn_background_tasks` and
/// `ApiGatewayService::serve`, called separately so the caller can log
/// "ready" only once both have happened.
pub async fn build(
    config: &NodeConfig,
    metrics: Arc<pc_telemetry::PoolMetrics>,
    registry: Arc<Registry>,
) -> Result<PoolProcess, WiringError> {
    let storage: Arc<dyn StoragePort> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("using in-memory storage backend");
            Arc::new(Repository::new(InMemoryKVStore::new()))
        }
        #[cfg(feature = "rocksdb-backend")]
        StorageBackend::Rocksdb => {
            info!(data_dir = %config.storage.data_dir.display(), "opening rocksdb storage backend");
            let store = pc_storage::RocksDbStore::open(&config.storage.data_dir).map_err(|source| {
                WiringError::Storage { path: config.storage.data_dir.display().to_string(), source }
            })?;
            Arc::new(Repository::new(store))
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageBackend::Rocksdb => {
            info!("rocksdb-backend feature disabled, falling back to in-memory storage");
            Arc::new(Repository::new(InMemoryKVStore::new()))
        }
    };

    let timeout = Duration::from_secs(config.pool.wallet_timeout_secs);
    let transports: Vec<Arc<dyn WalletTransport>> = config
        .pool
        .wallet_urls
        .iter()
        .map(|url| Arc::new(HttpWalletTransport::new(url, timeout)) as Arc<dyn WalletTransport>)
        .collect();
    let wallet: Arc<dyn WalletPort> =
        Arc::new(WalletClient::new(transports, config.pool.secret_phrase.clone(), config.pool.tx_fee));

    info!("confirming at least one configured wallet responds");
    wallet.get_mining_info().await?;

    let kernel = Arc::new(BatchDispatcher::new());
    let events = Arc::new(InMemoryEventBus::new());

    let core = PoolCore::new(config.pool.clone(), storage, wallet, kernel, events, metrics);
    let gateway = ApiGatewayService::new(config.gateway.clone(), core.submission_pipeline(), registry)?;

    Ok(PoolProcess { core, gateway })
}
