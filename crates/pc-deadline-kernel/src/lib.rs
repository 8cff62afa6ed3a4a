//! # Deadline kernel
//!
//! The compute-bound heart of nonce validation: given `(accountId, nonce,
//! baseTarget, scoop, genSig)`, produce the deadline (seconds until that
//! nonce would permit forging). Upstream this is a closed-source SIMD
//! library invoked in lockstep batches of 8 (AVX2) or 4 (SSE4); this crate
//! reimplements the *contract* — batching, timeout-driven flush, and fatal
//! startup if neither instruction set is present — with a portable,
//! self-consistent reference hash in place of the inaccessible original.
//! See `algorithm.rs` for the honest accounting of what that means.
//!
//! Scoop derivation (`calc_scoop`) is likewise native/closed-source upstream
//! (no portable reference exists for it either); this crate substitutes a
//! self-consistent SHA-256-based derivation with the same shape — height and
//! generation signature in, a scoop in `[0, 4096)` out — rather than the
//! native hash.
//!
//! ## Crate structure
//!
//! - `domain/` — `DeadlineRequest`, `DeadlineKernelError`.
//! - `scoop.rs` — `calc_scoop(height, genSig)`.
//! - `algorithm.rs` — the per-request hash/deadline computation.
//! - `dispatcher.rs` — `BatchDispatcher`, the batching worker pool.

pub mod algorithm;
pub mod dispatcher;
pub mod domain;
pub mod scoop;

use async_trait::async_trait;

pub use domain::types::{DeadlineKernelError, DeadlineRequest};
pub use dispatcher::{BatchDispatcher, BatchWidth, DispatcherConfig};
pub use scoop::calc_scoop;

/// What the round engine depends on: submit a request, await its deadline.
#[async_trait]
pub trait DeadlineKernel: Send + Sync {
    async fn calc_deadline(&self, req: DeadlineRequest) -> Result<u64, DeadlineKernelError>;
}

#[async_trait]
impl DeadlineKernel for BatchDispatcher {
    async fn calc_deadline(&self, req: DeadlineRequest) -> Result<u64, DeadlineKernelError> {
        self.submit(req).await
    }
}
