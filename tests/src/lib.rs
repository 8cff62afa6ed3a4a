//! # Pool-Core Test Suite
//!
//! Cross-component choreography tests that exercise the round engine end to
//! end against in-memory adapters: storage (`InMemoryKVStore`), wallet
//! (`support::MockWallet`), and deadline kernel (`support::FixedDeadlineKernel`).
//!
//! Each crate under `crates/` carries its own unit tests in `#[cfg(test)]`
//! modules next to the code; this crate is for behaviour that only shows up
//! once the pieces are wired together.
//!
//! ```text
//! tests/src/
//! ├── support.rs    # mock WalletPort/DeadlineKernel + context builder
//! └── integration/  # cross-component choreography
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
