//! Mock `WalletPort` and `DeadlineKernel` implementations, plus a builder
//! for a fully wired `PoolContext` over in-memory storage. Shared by every
//! integration test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pc_deadline_kernel::{DeadlineKernel, DeadlineKernelError, DeadlineRequest};
use pc_storage::{InMemoryKVStore, Repository, StoragePort};
use pc_telemetry::PoolMetrics;
use pc_wallet_client::{AccountInfo, BlockInfo, MiningInfo, WalletPort};
use prometheus::Registry;
use round_engine::config::PoolConfig;
use round_engine::context::PoolContext;
use round_engine::domain::{RoundInfo, RoundState};
use shared_bus::InMemoryEventBus;
use shared_types::WalletError;

/// Scripted wallet responses for a single test. Every method records its
/// call so assertions can check what the round engine actually did.
#[derive(Default)]
pub struct MockWallet {
    pub mining_info: Mutex<Option<MiningInfo>>,
    pub block_infos: Mutex<HashMap<u64, BlockInfo>>,
    pub won_blocks: Mutex<HashMap<u64, (bool, BlockInfo)>>,
    pub reward_recipients: Mutex<Vec<u64>>,
    pub incoming_msgs: Mutex<HashMap<u64, String>>,
    pub generation_times: Mutex<HashMap<u64, i64>>,
    pub transaction_heights: Mutex<HashMap<u64, Option<u64>>>,
    pub submitted_nonces: Mutex<Vec<(u64, u64)>>,
    pub single_payments: Mutex<Vec<(u64, i64)>>,
    pub multi_payments: Mutex<Vec<Vec<(u64, i64)>>>,
    next_tx_id: Mutex<u64>,
}

impl MockWallet {
    #[must_use]
    pub fn new() -> Self {
        Self { next_tx_id: Mutex::new(1), ..Default::default() }
    }

    pub fn set_reward_recipients(&self, ids: Vec<u64>) {
        *self.reward_recipients.lock().unwrap() = ids;
    }

    pub fn set_won_block(&self, height: u64, won: bool, info: BlockInfo) {
        self.won_blocks.lock().unwrap().insert(height, (won, info));
    }

    pub fn set_incoming_msg(&self, sender: u64, body: &str) {
        self.incoming_msgs.lock().unwrap().insert(sender, body.to_string());
    }

    #[must_use]
    pub fn submitted_count(&self) -> usize {
        self.submitted_nonces.lock().unwrap().len()
    }

    fn take_tx_id(&self) -> u64 {
        let mut id = self.next_tx_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }
}

#[async_trait]
impl WalletPort for MockWallet {
    async fn get_mining_info(&self) -> Result<MiningInfo, WalletError> {
        self.mining_info.lock().unwrap().clone().ok_or(WalletError::NoWalletResponded)
    }

    async fn get_block_info(&self, height: u64) -> Result<BlockInfo, WalletError> {
        self.block_infos.lock().unwrap().get(&height).copied().ok_or(WalletError::NoWalletResponded)
    }

    async fn submit_nonce(&self, nonce: u64, account_id: u64) -> Result<u64, WalletError> {
        self.submitted_nonces.lock().unwrap().push((account_id, nonce));
        Ok(0)
    }

    async fn send_payment(&self, account_id: u64, amount_planck: i64) -> Result<u64, WalletError> {
        self.single_payments.lock().unwrap().push((account_id, amount_planck));
        Ok(self.take_tx_id())
    }

    async fn send_payment_multi(&self, recipients: &[(u64, i64)]) -> Result<u64, WalletError> {
        self.multi_payments.lock().unwrap().push(recipients.to_vec());
        Ok(self.take_tx_id())
    }

    async fn get_account_info(&self, _account_id: u64) -> Result<AccountInfo, WalletError> {
        serde_json::from_str(r#"{"name":null}"#).map_err(|e| WalletError::Decode(e.to_string()))
    }

    async fn get_reward_recipients(&self, _pool_account_id: u64) -> Result<Vec<u64>, WalletError> {
        Ok(self.reward_recipients.lock().unwrap().clone())
    }

    async fn won_block(&self, height: u64, _miner_id: u64, _nonce: u64) -> Result<(bool, BlockInfo), WalletError> {
        self.won_blocks.lock().unwrap().get(&height).copied().ok_or(WalletError::NoWalletResponded)
    }

    async fn get_generation_time(&self, height: u64) -> Result<i64, WalletError> {
        self.generation_times.lock().unwrap().get(&height).copied().ok_or(WalletError::NoWalletResponded)
    }

    async fn get_incoming_msgs_since(
        &self,
        _pool_account_id: u64,
        _since_timestamp: i64,
    ) -> Result<HashMap<u64, String>, WalletError> {
        let mut guard = self.incoming_msgs.lock().unwrap();
        Ok(std::mem::take(&mut *guard))
    }

    async fn get_transaction(&self, transaction_id: u64) -> Result<Option<u64>, WalletError> {
        Ok(self.transaction_heights.lock().unwrap().get(&transaction_id).copied().flatten())
    }
}

/// A deadline kernel that returns a pre-scripted deadline per
/// `(accountId, nonce)`, falling back to `default_deadline`. Stands in for
/// the real SIMD batch dispatcher, which needs physical AVX2/SSE4 hardware.
pub struct FixedDeadlineKernel {
    deadlines: Mutex<HashMap<(u64, u64), u64>>,
    default_deadline: u64,
}

impl FixedDeadlineKernel {
    #[must_use]
    pub fn new(default_deadline: u64) -> Self {
        Self { deadlines: Mutex::new(HashMap::new()), default_deadline }
    }

    pub fn set(&self, account_id: u64, nonce: u64, deadline: u64) {
        self.deadlines.lock().unwrap().insert((account_id, nonce), deadline);
    }
}

#[async_trait]
impl DeadlineKernel for FixedDeadlineKernel {
    async fn calc_deadline(&self, req: DeadlineRequest) -> Result<u64, DeadlineKernelError> {
        let deadline =
            self.deadlines.lock().unwrap().get(&(req.account_id, req.nonce)).copied().unwrap_or(self.default_deadline);
        Ok(deadline)
    }
}

/// A minimal `PoolConfig` that passes `validate()`, tuned for fast tests:
/// zero payout delays, a tiny EEPS window, and an unmetered rate limiter.
#[must_use]
pub fn test_config() -> PoolConfig {
    PoolConfig {
        secret_phrase: "test-secret".to_string(),
        wallet_urls: vec!["http://127.0.0.1:8125".to_string()],
        pool_public_id: 1,
        fee_account_id: Some(99),
        pool_fee_share: 0.1,
        winner_share: 0.2,
        tx_fee: 100_000_000,
        deadline_limit: 0,
        inactive_after_x_blocks: 1440,
        block_height_payout_delay: 0,
        payout_delay_secs: 0,
        navg: 10,
        nmin: 2,
        allow_requests_per_second: 1000,
        pool_port: 8124,
        ..PoolConfig::default()
    }
}

/// Wires a `PoolContext` over an in-memory store and the given mock wallet
/// and kernel, starting the round at `round`.
pub fn build_context<W, K>(config: PoolConfig, wallet: Arc<W>, kernel: Arc<K>, round: RoundInfo) -> Arc<PoolContext>
where
    W: WalletPort + 'static,
    K: DeadlineKernel + 'static,
{
    let storage: Arc<dyn StoragePort> = Arc::new(Repository::new(InMemoryKVStore::new()));
    let events = Arc::new(InMemoryEventBus::new());
    let metrics = Arc::new(PoolMetrics::new(&Registry::new()).expect("metric registration"));
    let round_state = RoundState::new(round);
    Arc::new(PoolContext::new(config, storage, wallet, kernel, events, metrics, round_state))
}

#[must_use]
pub fn now_unix() -> i64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).expect("system clock before epoch").as_secs() as i64
}

/// Polls `cond` every 10ms until it's true or `timeout` elapses, returning
/// the last observed value. Used instead of a fixed sleep to keep tests both
/// fast and non-flaky against fire-and-forget async writes.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return cond();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
