//! Small value types shared verbatim across crate boundaries.

use serde::{Deserialize, Serialize};

/// The 32-byte generation signature that characterises a round and drives
/// scoop derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationSignature(pub [u8; 32]);

impl GenerationSignature {
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut out = [0u8; 32];
        for i in 0..32 {
            out[i] = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(out))
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A miner's standing instruction for when accrued balance should be paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutInterval {
    Weekly,
    Daily,
    Now,
}

impl PayoutInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutInterval::Weekly => "weekly",
            PayoutInterval::Daily => "daily",
            PayoutInterval::Now => "now",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_signature_hex_round_trip() {
        let hex = "2a07570000000000000000000000000000000000000000000000000000037a0a";
        // Truncate/pad to exactly 64 hex chars for this smoke test.
        let hex64 = format!("{hex:0<64}");
        let sig = GenerationSignature::from_hex(&hex64).unwrap();
        assert_eq!(sig.to_hex(), hex64);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(GenerationSignature::from_hex("abcd").is_none());
    }
}
