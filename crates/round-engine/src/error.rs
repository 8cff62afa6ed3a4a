//! Error taxonomy for the round engine.

use thiserror::Error;

/// Result type alias for round-engine operations.
pub type Result<T> = std::result::Result<T, RoundEngineError>;

/// Wire error codes returned to miners (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireErrorCode {
    WrongRewardRecipient = 1004,
    WrongHeight = 1005,
    DeadlineExceedsLimit = 1008,
    MalformedNonce = 1012,
    MalformedAccountId = 1013,
    RewardRecipientLookupFailed = 1014,
}

impl WireErrorCode {
    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// HTTP status the gateway should respond with for this code.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::WrongRewardRecipient => 403,
            Self::WrongHeight | Self::DeadlineExceedsLimit | Self::MalformedNonce | Self::MalformedAccountId => 400,
            Self::RewardRecipientLookupFailed => 503,
        }
    }
}

#[derive(Error, Debug)]
pub enum RoundEngineError {
    #[error("submission rejected: {code:?} — {message}")]
    SubmissionRejected { code: WireErrorCode, message: String },

    /// Token-bucket exhausted for this (remote IP, requestType) pair.
    /// Wire shape is a bare 429 with body `"limit exceeded"`, not the
    /// `{errorCode, errorDescription}` JSON the other wire errors use.
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("storage error: {0}")]
    Storage(#[from] shared_types::StorageError),

    #[error("wallet error: {0}")]
    Wallet(#[from] shared_types::WalletError),

    #[error("deadline kernel error: {0}")]
    DeadlineKernel(String),

    #[error("address codec error: {0}")]
    AddressCodec(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RoundEngineError {
    /// Whether a periodic job should simply skip this cycle and retry on
    /// the next tick (§7 internal policy) rather than treat it as fatal.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Wallet(_) | Self::DeadlineKernel(_))
    }

    /// HTTP status the gateway should respond with, for errors that reach
    /// it directly rather than through `SubmissionRejected`.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::SubmissionRejected { code, .. } => code.http_status(),
            Self::RateLimited => 429,
            Self::Wallet(_) => 503,
            _ => 500,
        }
    }

    /// Whether this should propagate to process exit.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}
