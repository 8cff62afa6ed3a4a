//! Request/error vocabulary for the deadline kernel.

use shared_types::GenerationSignature;
use thiserror::Error;

/// One miner's candidate: validated fully once a deadline comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineRequest {
    pub account_id: u64,
    pub nonce: u64,
    pub base_target: u64,
    pub scoop: u32,
    pub gen_sig: GenerationSignature,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeadlineKernelError {
    #[error("kernel shut down before this request's batch was dispatched")]
    Closed,
}
