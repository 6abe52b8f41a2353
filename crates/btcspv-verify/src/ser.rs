//! Hex helpers and serde adapters for the JSON interchange format.
//!
//! Byte fields are written as `0x`-prefixed lowercase hex strings. Reading accepts the prefix
//! in either case, or its absence.

use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serializer};

/// Strip a leading `0x` or `0X` if present.
pub fn strip_0x_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string, with or without a `0x` prefix.
pub fn deserialize_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_0x_prefix(s))
}

/// Encode bytes as a `0x`-prefixed hex string.
pub fn serialize_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Serde adapter for variable-length byte vectors
pub mod hex_bytes {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&serialize_hex(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        deserialize_hex(&hex_string).map_err(SerdeError::custom)
    }
}

/// Serde adapter for fixed-size byte arrays (digests, raw headers)
pub mod hex_array {
    use super::*;

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&serialize_hex(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = deserialize_hex(&hex_string).map_err(SerdeError::custom)?;
        let length = bytes.len();
        bytes
            .try_into()
            .map_err(|_| SerdeError::custom(format!("expected {} bytes, got {}", N, length)))
    }
}
