//! Wire-shaped reply types for the wallet node's `/burst` RPC surface.
//!
//! These mirror only the fields the pool actually reads; the wallet's full
//! JSON response carries more.

use serde::Deserialize;
use shared_types::GenerationSignature;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMiningInfo {
    #[serde(rename = "generationSignature")]
    pub generation_signature: String,
    #[serde(rename = "baseTarget")]
    pub base_target: String,
    pub height: String,
    #[serde(rename = "errorDescription", default)]
    pub error_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningInfo {
    pub generation_signature: GenerationSignature,
    pub base_target: u64,
    pub height: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawBlockInfo {
    #[serde(rename = "generator")]
    pub generator_id: String,
    #[serde(rename = "blockReward")]
    pub block_reward: String,
    #[serde(rename = "totalFeeNQT")]
    pub total_fee_nqt: String,
    #[serde(rename = "baseTarget")]
    pub base_target: String,
    pub nonce: String,
    pub height: u64,
    pub timestamp: i64,
    #[serde(rename = "numberOfTransactions", default)]
    pub number_of_transactions: u32,
    #[serde(rename = "errorDescription", default)]
    pub error_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub generator_id: u64,
    pub block_reward: i64,
    pub total_fee_nqt: i64,
    pub base_target: u64,
    pub nonce: u64,
    pub height: u64,
    pub timestamp: i64,
    pub number_of_transactions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawNonceInfo {
    #[serde(default)]
    pub deadline: u64,
    #[serde(default)]
    pub result: String,
    #[serde(rename = "errorDescription", default)]
    pub error_description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSendMoney {
    #[serde(rename = "transaction", default)]
    pub tx_id: String,
    #[serde(rename = "errorDescription", default)]
    pub error_description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "errorDescription", default)]
    pub(crate) error_description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAttachment {
    #[serde(rename = "message", default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTransactionInfo {
    pub sender: String,
    pub height: u64,
    #[serde(default)]
    pub attachment: RawAttachment,
}

impl Default for RawAttachment {
    fn default() -> Self {
        RawAttachment { message: String::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTransactionsInfo {
    #[serde(default)]
    pub transactions: Vec<RawTransactionInfo>,
    #[serde(rename = "errorDescription", default)]
    pub error_description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRewardRecipients {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(rename = "errorDescription", default)]
    pub error_description: String,
}
