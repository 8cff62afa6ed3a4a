//! Error types for the storage layer.

use thiserror::Error;

pub use shared_types::StorageError;

/// Key-value store errors, below the `StorageError` abstraction.
#[derive(Debug, Clone, Error)]
pub enum KVStoreError {
    #[error("storage I/O error: {message}")]
    Io { message: String },

    #[error("storage corruption: {message}")]
    Corruption { message: String },

    #[error("transaction conflict, retry")]
    Conflict,
}

impl From<KVStoreError> for StorageError {
    fn from(err: KVStoreError) -> Self {
        match err {
            KVStoreError::Conflict => StorageError::TransactionConflict,
            KVStoreError::Corruption { message } => StorageError::DataCorruption(message),
            KVStoreError::Io { message } => StorageError::Database(message),
        }
    }
}

/// Serialization errors, raised by the bincode row codec.
#[derive(Debug, Clone, Error)]
#[error("serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl From<SerializationError> for StorageError {
    fn from(err: SerializationError) -> Self {
        StorageError::DataCorruption(err.message)
    }
}
