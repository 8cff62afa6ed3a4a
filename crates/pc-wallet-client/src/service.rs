//! `WalletClient`: aggregates one or more upstream wallet nodes behind the
//! single `WalletPort` the round engine depends on.
//!
//! Two dispatch strategies, mirroring the pool's original wallet handler:
//!
//! - `request_all` fans a read out to every configured wallet concurrently
//!   and lets the caller pick a winner (used only by `get_mining_info`,
//!   where the wallet with the tallest chain wins).
//! - `request_random` tries wallets one at a time until one succeeds, for
//!   everything else — submitting a nonce or sending a payment to every
//!   wallet would be wasteful and, for payments, dangerous.

use async_trait::async_trait;
use shared_types::{GenerationSignature, WalletError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::domain::types::{
    AccountInfo, BlockInfo, MiningInfo, RawBlockInfo, RawMiningInfo, RawNonceInfo, RawRewardRecipients,
    RawSendMoney, RawTransactionInfo, RawTransactionsInfo,
};
use crate::ports::inbound::WalletPort;
use crate::ports::outbound::{RpcMethod, WalletTransport};

pub struct WalletClient {
    transports: Vec<Arc<dyn WalletTransport>>,
    secret_phrase: String,
    pool_tx_fee: i64,
}

impl WalletClient {
    pub fn new(transports: Vec<Arc<dyn WalletTransport>>, secret_phrase: String, pool_tx_fee: i64) -> Self {
        Self {
            transports,
            secret_phrase,
            pool_tx_fee,
        }
    }

    async fn request_all(
        &self,
        method: RpcMethod,
        params: HashMap<&'static str, String>,
    ) -> Result<Vec<(String, serde_json::Value)>, WalletError> {
        let mut set = JoinSet::new();
        for transport in &self.transports {
            let transport = transport.clone();
            let params = params.clone();
            set.spawn(async move {
                let label = transport.label().to_string();
                let result = transport.request(method, &params).await;
                (label, result)
            });
        }

        let mut ok = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((label, Ok(body))) => ok.push((label, body)),
                Ok((label, Err(err))) => {
                    tracing::error!(wallet = %label, error = %err, "wallet request failed");
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "wallet request task panicked");
                }
            }
        }

        if ok.is_empty() {
            return Err(WalletError::NoWalletResponded);
        }
        Ok(ok)
    }

    async fn request_random(
        &self,
        method: RpcMethod,
        params: HashMap<&'static str, String>,
    ) -> Result<serde_json::Value, WalletError> {
        for transport in &self.transports {
            match transport.request(method, &params).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    tracing::error!(wallet = transport.label(), error = %err, "wallet request failed");
                }
            }
        }
        Err(WalletError::NoWalletResponded)
    }

    fn error_description(body: &serde_json::Value) -> Option<String> {
        body.get("errorDescription")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn parse_u64(s: &str) -> Result<u64, WalletError> {
    s.parse().map_err(|_| WalletError::Decode(format!("not a u64: {s}")))
}

fn parse_i64(s: &str) -> Result<i64, WalletError> {
    s.parse().map_err(|_| WalletError::Decode(format!("not an i64: {s}")))
}

fn decode(body: &serde_json::Value) -> Result<serde_json::Value, WalletError> {
    if let Some(desc) = WalletClient::error_description(body) {
        return Err(WalletError::WalletReported(desc));
    }
    Ok(body.clone())
}

#[async_trait]
impl WalletPort for WalletClient {
    async fn get_mining_info(&self) -> Result<MiningInfo, WalletError> {
        let results = self
            .request_all(RpcMethod::Get, HashMap::from([("requestType", "getMiningInfo".to_string())]))
            .await?;

        let mut best: Option<MiningInfo> = None;
        for (label, body) in results {
            let raw: RawMiningInfo = match serde_json::from_value(body) {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(wallet = %label, error = %e, "unpacking getMiningInfo failed");
                    continue;
                }
            };
            if !raw.error_description.is_empty() {
                tracing::error!(wallet = %label, error = %raw.error_description, "wallet returned error");
                continue;
            }

            let height = match parse_u64(&raw.height) {
                Ok(h) => h,
                Err(_) => continue,
            };

            if let Some(current) = &best {
                if height < current.height {
                    tracing::warn!(wallet = %label, height, pool_height = current.height, "wallet lags behind other wallets");
                    continue;
                }
                if height == current.height {
                    continue;
                }
            }

            let base_target = match parse_u64(&raw.base_target) {
                Ok(b) => b,
                Err(_) => continue,
            };
            let generation_signature = match GenerationSignature::from_hex(&raw.generation_signature) {
                Some(g) => g,
                None => continue,
            };

            best = Some(MiningInfo { generation_signature, base_target, height });
        }

        best.ok_or(WalletError::NoWalletResponded)
    }

    async fn get_block_info(&self, height: u64) -> Result<BlockInfo, WalletError> {
        let params = HashMap::from([
            ("requestType", "getBlock".to_string()),
            ("height", height.to_string()),
        ]);
        let body = self.request_random(RpcMethod::Get, params).await?;
        let body = decode(&body)?;
        let raw: RawBlockInfo = serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;

        Ok(BlockInfo {
            generator_id: parse_u64(&raw.generator_id)?,
            block_reward: parse_i64(&raw.block_reward)?,
            total_fee_nqt: parse_i64(&raw.total_fee_nqt)?,
            base_target: parse_u64(&raw.base_target)?,
            nonce: parse_u64(&raw.nonce)?,
            height: raw.height,
            timestamp: raw.timestamp,
            number_of_transactions: raw.number_of_transactions,
        })
    }

    async fn submit_nonce(&self, nonce: u64, account_id: u64) -> Result<u64, WalletError> {
        let params = HashMap::from([
            ("requestType", "submitNonce".to_string()),
            ("nonce", nonce.to_string()),
            ("accountId", account_id.to_string()),
            ("secretPhrase", self.secret_phrase.clone()),
        ]);
        let body = self.request_random(RpcMethod::Post, params).await?;
        let raw: RawNonceInfo = serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;

        if raw.result != "success" {
            return Err(WalletError::WalletReported(raw.result));
        }
        Ok(raw.deadline)
    }

    async fn send_payment(&self, account_id: u64, amount_planck: i64) -> Result<u64, WalletError> {
        let params = HashMap::from([
            ("requestType", "sendMoney".to_string()),
            ("recipient", account_id.to_string()),
            ("deadline", "1440".to_string()),
            ("feeNQT", self.pool_tx_fee.to_string()),
            ("amountNQT", amount_planck.to_string()),
            ("secretPhrase", self.secret_phrase.clone()),
        ]);
        let body = self.request_random(RpcMethod::Post, params).await?;
        let raw: RawSendMoney = serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;

        let tx_id = parse_u64(&raw.tx_id).unwrap_or(0);
        if tx_id == 0 {
            return Err(WalletError::WalletReported(raw.error_description));
        }
        Ok(tx_id)
    }

    async fn send_payment_multi(&self, recipients: &[(u64, i64)]) -> Result<u64, WalletError> {
        debug_assert!(recipients.len() <= 64, "multi-out payment limit is 64 recipients");
        let recipients_param = recipients
            .iter()
            .map(|(id, amount)| format!("{id}:{amount}"))
            .collect::<Vec<_>>()
            .join(";");
        let params = HashMap::from([
            ("requestType", "sendMoneyMulti".to_string()),
            ("recipients", recipients_param),
            ("deadline", "1440".to_string()),
            ("feeNQT", self.pool_tx_fee.to_string()),
            ("secretPhrase", self.secret_phrase.clone()),
        ]);
        let body = self.request_random(RpcMethod::Post, params).await?;
        let raw: RawSendMoney = serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;

        let tx_id = parse_u64(&raw.tx_id).unwrap_or(0);
        if tx_id == 0 {
            return Err(WalletError::WalletReported(raw.error_description));
        }
        Ok(tx_id)
    }

    async fn get_reward_recipients(&self, pool_account_id: u64) -> Result<Vec<u64>, WalletError> {
        let params = HashMap::from([
            ("requestType", "getAccountsWithRewardRecipient".to_string()),
            ("account", pool_account_id.to_string()),
        ]);
        let body = self.request_random(RpcMethod::Post, params).await?;
        let body = decode(&body)?;
        let raw: RawRewardRecipients = serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;
        raw.accounts.iter().map(|s| parse_u64(s)).collect()
    }

    async fn get_account_info(&self, account_id: u64) -> Result<AccountInfo, WalletError> {
        let params = HashMap::from([
            ("requestType", "getAccount".to_string()),
            ("account", account_id.to_string()),
        ]);
        let body = self.request_random(RpcMethod::Post, params).await?;
        let raw: AccountInfo = serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;
        if !raw.error_description.is_empty() {
            return Err(WalletError::WalletReported(raw.error_description));
        }
        Ok(raw)
    }

    async fn won_block(
        &self,
        height: u64,
        miner_id: u64,
        nonce: u64,
    ) -> Result<(bool, BlockInfo), WalletError> {
        let block_info = self.get_block_info(height).await?;
        let won = block_info.generator_id == miner_id && block_info.nonce == nonce;
        tracing::info!(
            height,
            generator = block_info.generator_id,
            nonce = block_info.nonce,
            expected_generator = miner_id,
            expected_nonce = nonce,
            won,
            "checking if block was won"
        );
        Ok((won, block_info))
    }

    async fn get_generation_time(&self, height: u64) -> Result<i64, WalletError> {
        let previous = self.get_block_info(height - 1).await?;
        let current = self.get_block_info(height).await?;
        Ok(current.timestamp - previous.timestamp)
    }

    async fn get_incoming_msgs_since(
        &self,
        pool_account_id: u64,
        since_timestamp: i64,
    ) -> Result<HashMap<u64, String>, WalletError> {
        let params = HashMap::from([
            ("requestType", "getAccountTransactions".to_string()),
            ("account", pool_account_id.to_string()),
            ("type", "1".to_string()),
            ("subtype", "0".to_string()),
            ("timestamp", since_timestamp.to_string()),
        ]);
        let body = self.request_random(RpcMethod::Post, params).await?;
        let body = decode(&body)?;
        let raw: RawTransactionsInfo =
            serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;

        let mut by_sender = HashMap::new();
        for tx in raw.transactions {
            let sender = parse_u64(&tx.sender)?;
            if sender != pool_account_id {
                by_sender.insert(sender, tx.attachment.message);
            }
        }
        Ok(by_sender)
    }

    async fn get_transaction(&self, transaction_id: u64) -> Result<Option<u64>, WalletError> {
        let params = HashMap::from([
            ("requestType", "getTransaction".to_string()),
            ("transaction", transaction_id.to_string()),
        ]);
        let body = self.request_random(RpcMethod::Get, params).await?;
        match decode(&body) {
            Ok(body) => {
                let raw: RawTransactionInfo =
                    serde_json::from_value(body).map_err(|e| WalletError::Decode(e.to_string()))?;
                Ok(Some(raw.height))
            }
            Err(WalletError::WalletReported(desc)) if desc.to_lowercase().contains("unknown transaction") => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::RpcMethod as M;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubTransport {
        label: String,
        replies: Vec<serde_json::Value>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WalletTransport for StubTransport {
        fn label(&self) -> &str {
            &self.label
        }

        async fn request(
            &self,
            _method: M,
            _params: &HashMap<&'static str, String>,
        ) -> Result<serde_json::Value, String> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies.get(i).cloned().ok_or_else(|| "exhausted".to_string())
        }
    }

    fn stub(label: &str, reply: serde_json::Value) -> Arc<dyn WalletTransport> {
        Arc::new(StubTransport {
            label: label.to_string(),
            replies: vec![reply],
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn get_mining_info_prefers_tallest_wallet() {
        let sig = "2a".repeat(32);
        let behind = stub(
            "behind",
            serde_json::json!({"generationSignature": sig, "baseTarget": "100", "height": "10"}),
        );
        let ahead = stub(
            "ahead",
            serde_json::json!({"generationSignature": sig, "baseTarget": "200", "height": "20"}),
        );
        let client = WalletClient::new(vec![behind, ahead], "secret".to_string(), 100_000_000);

        let info = client.get_mining_info().await.unwrap();
        assert_eq!(info.height, 20);
        assert_eq!(info.base_target, 200);
    }

    #[tokio::test]
    async fn get_mining_info_fails_when_no_wallet_responds() {
        let transport: Arc<dyn WalletTransport> = Arc::new(StubTransport {
            label: "dead".to_string(),
            replies: vec![],
            calls: AtomicUsize::new(0),
        });
        let client = WalletClient::new(vec![transport], "secret".to_string(), 100_000_000);
        assert_eq!(client.get_mining_info().await.unwrap_err(), WalletError::NoWalletResponded);
    }

    #[tokio::test]
    async fn submit_nonce_surfaces_wallet_rejection() {
        let transport = stub("w", serde_json::json!({"deadline": 0, "result": "deadline too low"}));
        let client = WalletClient::new(vec![transport], "secret".to_string(), 100_000_000);
        let err = client.submit_nonce(123, 456).await.unwrap_err();
        assert_eq!(err, WalletError::WalletReported("deadline too low".to_string()));
    }

    #[tokio::test]
    async fn submit_nonce_returns_wallet_deadline_on_success() {
        let transport = stub("w", serde_json::json!({"deadline": 987654, "result": "success"}));
        let client = WalletClient::new(vec![transport], "secret".to_string(), 100_000_000);
        assert_eq!(client.submit_nonce(123, 456).await.unwrap(), 987654);
    }

    #[tokio::test]
    async fn send_payment_multi_surfaces_wallet_rejection() {
        let transport = stub("w", serde_json::json!({"transaction": "0", "errorDescription": "insufficient funds"}));
        let client = WalletClient::new(vec![transport], "secret".to_string(), 100_000_000);
        let err = client.send_payment_multi(&[(1, 100), (2, 200)]).await.unwrap_err();
        assert_eq!(err, WalletError::WalletReported("insufficient funds".to_string()));
    }

    #[tokio::test]
    async fn get_reward_recipients_parses_account_list() {
        let transport = stub("w", serde_json::json!({"accounts": ["1", "2", "3"]}));
        let client = WalletClient::new(vec![transport], "secret".to_string(), 100_000_000);
        let ids = client.get_reward_recipients(99).await.unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn won_block_compares_generator_and_nonce() {
        let transport = stub(
            "w",
            serde_json::json!({
                "generator": "456", "blockReward": "100", "totalFeeNQT": "1",
                "baseTarget": "100", "nonce": "123", "height": 99, "timestamp": 1000
            }),
        );
        let client = WalletClient::new(vec![transport], "secret".to_string(), 100_000_000);
        let (won, info) = client.won_block(99, 456, 123).await.unwrap();
        assert!(won);
        assert_eq!(info.generator_id, 456);
    }
}
