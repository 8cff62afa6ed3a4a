//! The actual per-request deadline hash.
//!
//! Upstream, this computation is performed by a closed-source native
//! library invoked over cgo; its plot-file hashing algorithm is not part of
//! this corpus and its concrete test vectors (e.g. the deadline for
//! accountId=10282355196851764065, nonce=6729, baseTarget=18325193796,
//! scoop=30) cannot be reproduced without it. What *is* specified is the
//! kernel's contract — inputs, batching, and `deadline = hit / baseTarget`
//! — so this is a from-scratch, portable reference implementation of that
//! contract: deterministic, sensitive to every input field, and internally
//! consistent, but it will not reproduce deadlines computed by a real
//! plotted miner against the genuine chain. See `DESIGN.md`.

use sha2::{Digest, Sha256};

use crate::domain::types::DeadlineRequest;

/// The "hit" for a scoop probe: first 8 bytes of
/// SHA256(genSig ‖ accountId ‖ nonce ‖ scoop), big-endian.
fn hit(req: &DeadlineRequest) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(req.gen_sig.as_bytes());
    hasher.update(req.account_id.to_be_bytes());
    hasher.update(req.nonce.to_be_bytes());
    hasher.update(req.scoop.to_be_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes(digest[0..8].try_into().expect("sha256 digest is 32 bytes"))
}

/// `deadline = hit / baseTarget`, the same shape as the real chain's.
/// `baseTarget` is never zero for a live round; guard it anyway so a
/// misconfigured test fixture panics with a clear divide-by-zero instead of
/// silently wrapping.
pub fn compute_deadline(req: &DeadlineRequest) -> u64 {
    hit(req) / req.base_target
}
