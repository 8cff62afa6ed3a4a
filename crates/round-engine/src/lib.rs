//! Round tracking, nonce submission, and reward/payout orchestration for the
//! pool (§4). `PoolCore` wires the domain aggregates, the service layer, and
//! the background tasks into the single handle `node-runtime` constructs and
//! the HTTP gateway calls into.

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod registry;
pub mod service;

use std::sync::Arc;

use pc_deadline_kernel::DeadlineKernel;
use pc_storage::StoragePort;
use pc_wallet_client::WalletPort;
use shared_bus::InMemoryEventBus;
use tracing::info;

pub use config::PoolConfig;
pub use context::PoolContext;
pub use error::{Result, RoundEngineError, WireErrorCode};
pub use service::{MiningInfoReply, SubmissionPipeline, SubmitReply};

use domain::{RoundInfo, RoundState};
use service::{BlockPoller, ForgingLoop, PeriodicJobs};

/// The fully wired pool: everything `node-runtime` needs to run the round
/// engine's background tasks and hand the submission pipeline to the HTTP
/// gateway.
pub struct PoolCore {
    ctx: Arc<PoolContext>,
    submission_pipeline: Arc<SubmissionPipeline>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
}

impl PoolCore {
    /// Builds the pool from its config and adapters. Starts from
    /// `RoundInfo::genesis()`; the block poller commits the real tip on its
    /// first tick.
    #[must_use]
    pub fn new(
        config: PoolConfig,
        storage: Arc<dyn StoragePort>,
        wallet: Arc<dyn WalletPort>,
        kernel: Arc<dyn DeadlineKernel>,
        events: Arc<InMemoryEventBus>,
        metrics: Arc<pc_telemetry::PoolMetrics>,
    ) -> Self {
        let round_state = RoundState::new(RoundInfo::genesis());
        let ctx = Arc::new(PoolContext::new(config, storage, wallet, kernel, events, metrics, round_state));
        let submission_pipeline = Arc::new(SubmissionPipeline::new(ctx.clone()));
        let (shutdown_tx, _) = tokio::sync::watch::channel(false);
        Self { ctx, submission_pipeline, shutdown_tx }
    }

    #[must_use]
    pub fn submission_pipeline(&self) -> Arc<SubmissionPipeline> {
        self.submission_pipeline.clone()
    }

    /// Spawns every background task (block poller, forging loop, periodic
    /// jobs) and returns their join handles. Callers keep the handles to
    /// await graceful shutdown after calling `shutdown`.
    pub fn spawn_background_tasks(&self) -> Vec<tokio::task::JoinHandle<()>> {
        let shutdown_rx = self.shutdown_tx.subscribe();

        let poller = BlockPoller::new(self.ctx.clone());
        let poller_shutdown = shutdown_rx.clone();
        let poller_handle = tokio::spawn(async move { poller.run(poller_shutdown).await });

        let forging = ForgingLoop::new(self.ctx.clone());
        let events = self.ctx.events.clone();
        let forging_shutdown = shutdown_rx.clone();
        let forging_handle = tokio::spawn(async move { forging.run(events.as_ref(), forging_shutdown).await });

        let periodic = PeriodicJobs::new(self.ctx.clone());
        let mut handles = vec![poller_handle, forging_handle];
        handles.extend(periodic.spawn_all(shutdown_rx));
        handles
    }

    /// Signals every background task to stop at its next check point.
    pub fn shutdown(&self) {
        info!("pool core shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }
}
