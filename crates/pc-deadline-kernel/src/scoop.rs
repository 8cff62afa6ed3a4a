//! Scoop derivation: like the deadline hash itself, the native function this
//! stands in for is closed-source, so only its contract (deterministic,
//! sensitive to both inputs, output in `[0, 4096)`) is reproduced here —
//! not its exact bit pattern.

use shared_types::GenerationSignature;
use sha2::{Digest, Sha256};

/// `scoop = first-4-bytes-of-SHA256(height_bigendian ‖ genSig) mod 4096`.
pub fn calc_scoop(height: u64, gen_sig: &GenerationSignature) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(height.to_be_bytes());
    hasher.update(gen_sig.as_bytes());
    let digest = hasher.finalize();

    let first4 = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    first4 % 4096
}
