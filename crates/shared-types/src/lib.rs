//! Primitive value types and shared error taxonomies.
//!
//! This is the single place definitions live when more than one crate in the
//! workspace needs the same small vocabulary: a 32-byte generation signature,
//! a payout interval, a storage error enum.

pub mod errors;
pub mod primitives;

pub use errors::{StorageError, WalletError};
pub use primitives::{GenerationSignature, PayoutInterval};
