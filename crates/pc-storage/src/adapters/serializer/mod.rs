pub mod bincode_codec;

pub use bincode_codec::{decode, encode};
