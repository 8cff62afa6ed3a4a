//! Port traits: `outbound` is what this crate needs from a database,
//! `inbound` is what the round engine needs from this crate.

pub mod inbound;
pub mod outbound;
