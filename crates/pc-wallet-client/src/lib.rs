//! # Wallet client
//!
//! An async aggregator over one or more upstream wallet nodes' `/burst`
//! JSON RPC endpoints: mining info, block info, nonce submission, payments,
//! and the account-to-account messages used for message-driven config.
//!
//! ## Crate structure (hexagonal)
//!
//! - `domain/` — reply types (`MiningInfo`, `BlockInfo`, `AccountInfo`) and
//!   their raw wire-shaped counterparts.
//! - `ports/` — `WalletTransport` (outbound, one wallet node) and
//!   `WalletPort` (inbound, what the round engine depends on).
//! - `adapters/` — `HttpWalletTransport` over `reqwest`.
//! - `service.rs` — `WalletClient`, the single implementation of
//!   `WalletPort` over any number of `WalletTransport`s.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::http::HttpWalletTransport;
pub use domain::types::{AccountInfo, BlockInfo, MiningInfo};
pub use ports::inbound::WalletPort;
pub use ports::outbound::{RpcMethod, WalletTransport};
pub use service::WalletClient;
