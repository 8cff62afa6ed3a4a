//! Adapter implementations of the outbound `KeyValueStore` port.

pub mod serializer;
pub mod storage;
