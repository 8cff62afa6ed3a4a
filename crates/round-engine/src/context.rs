//! Shared context every service-layer component is constructed with.
//!
//! Grouping these behind one `Arc<PoolContext>` (rather than threading a
//! dozen separate `Arc`s through every constructor) mirrors how the
//! teacher's subsystem containers hand a single shared handle to each
//! worker task.

use std::sync::Arc;

use pc_deadline_kernel::DeadlineKernel;
use pc_storage::StoragePort;
use pc_telemetry::PoolMetrics;
use pc_wallet_client::WalletPort;
use shared_bus::InMemoryEventBus;

use crate::config::PoolConfig;
use crate::domain::{AlphaTable, BlockWindowCache, RoundState};
use crate::error::{Result, RoundEngineError};
use crate::registry::{MinerRegistry, RewardRecipientCache};

pub struct PoolContext {
    pub config: PoolConfig,
    pub storage: Arc<dyn StoragePort>,
    pub wallet: Arc<dyn WalletPort>,
    pub kernel: Arc<dyn DeadlineKernel>,
    /// The concrete bus, not a trait object: the round engine both
    /// publishes (`EventPublisher`) and, in the forging loop, subscribes
    /// (`EventSubscriber`) — a single process only ever needs the one bus.
    pub events: Arc<InMemoryEventBus>,
    pub metrics: Arc<PoolMetrics>,

    pub registry: MinerRegistry,
    pub reward_recipients: RewardRecipientCache,
    pub round_state: RoundState,
    pub window_cache: BlockWindowCache,
    pub alphas: AlphaTable,
}

impl PoolContext {
    #[must_use]
    pub fn new(
        config: PoolConfig,
        storage: Arc<dyn StoragePort>,
        wallet: Arc<dyn WalletPort>,
        kernel: Arc<dyn DeadlineKernel>,
        events: Arc<InMemoryEventBus>,
        metrics: Arc<PoolMetrics>,
        round_state: RoundState,
    ) -> Self {
        let alphas = AlphaTable::compute(config.navg, config.nmin);
        let window_cache = BlockWindowCache::new(config.navg, config.t_min);
        Self {
            registry: MinerRegistry::new(),
            reward_recipients: RewardRecipientCache::new(),
            round_state,
            window_cache,
            alphas,
            config,
            storage,
            wallet,
            kernel,
            events,
            metrics,
        }
    }

    /// Runs a `StoragePort` call on the blocking-IO pool (the port is
    /// synchronous, mirroring the underlying key-value contract) and maps
    /// its error into `RoundEngineError`.
    pub async fn with_storage<T>(
        &self,
        f: impl FnOnce(&dyn StoragePort) -> std::result::Result<T, shared_types::StorageError> + Send + 'static,
    ) -> Result<T>
    where
        T: Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || f(storage.as_ref()))
            .await
            .expect("storage task panicked")
            .map_err(RoundEngineError::from)
    }
}
