//! # Storage
//!
//! The authoritative persistence layer for the pool: accounts, rounds
//! (blocks), nonce submissions, and outbound payout transactions.
//!
//! ## Crate structure (hexagonal)
//!
//! - `domain/` — entities (`Account`, `Block`, `NonceSubmission`,
//!   `Transaction`) and the error taxonomy.
//! - `ports/` — `KeyValueStore` (outbound, what this crate needs from a
//!   database) and `StoragePort` (inbound, what the round engine needs from
//!   this crate).
//! - `adapters/` — `InMemoryKVStore` for tests, `RocksDbStore` for
//!   production.
//! - `service.rs` — `Repository`, the single implementation of
//!   `StoragePort` over any `KeyValueStore`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::entities::{Account, Block, NonceSubmission, Transaction};
pub use domain::errors::{KVStoreError, SerializationError};
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use ports::inbound::StoragePort;
pub use service::Repository;

pub use adapters::storage::InMemoryKVStore;
#[cfg(feature = "rocksdb-backend")]
pub use adapters::storage::RocksDbStore;
