//! Shared error taxonomies used by more than one crate.
//!
//! Crate-local business logic (the round engine, the wallet client) defines
//! its own richer error enums; these are the handful of variants that the
//! storage port and its callers need to agree on verbatim.

use thiserror::Error;

/// Errors surfaced by the storage adapter (see `pc-storage`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("data corruption detected: {0}")]
    DataCorruption(String),

    #[error("underlying database error: {0}")]
    Database(String),

    #[error("transaction conflict, retry")]
    TransactionConflict,
}

/// Errors surfaced by the wallet client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet responded successfully within timeout")]
    NoWalletResponded,

    #[error("wallet returned error: {0}")]
    WalletReported(String),

    #[error("failed to decode wallet response: {0}")]
    Decode(String),
}
