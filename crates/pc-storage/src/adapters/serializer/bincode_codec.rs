//! bincode row codec used by every entity stored through `KeyValueStore`.

use crate::domain::errors::SerializationError;
use serde::{de::DeserializeOwned, Serialize};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(value).map_err(|e| SerializationError {
        message: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    bincode::deserialize(bytes).map_err(|e| SerializationError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
    }

    #[test]
    fn round_trips() {
        let row = Row {
            id: 42,
            name: "miner".to_string(),
        };
        let bytes = encode(&row).unwrap();
        let decoded: Row = decode(&bytes).unwrap();
        assert_eq!(row, decoded);
    }
}
