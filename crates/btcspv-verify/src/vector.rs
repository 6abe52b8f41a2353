//! Structural validation of length-prefixed transaction input and output vectors.
//!
//! A vector is a single-byte count prefix followed by exactly that many consensus-encoded
//! elements, back to back. Elements are decoded with the `bitcoin` crate's consensus codec,
//! which reports how many bytes each one consumed.

use bitcoin::consensus::encode::deserialize_partial;
use bitcoin::consensus::Decodable;
use bitcoin::{TxIn, TxOut};

use crate::error::VectorError;

/// Largest element count that fits a single-byte VarInt
pub const MAX_SINGLE_BYTE_COUNT: u8 = 0xfc;

/// Check that `vin` is a well-formed, length-prefixed input vector.
pub fn validate_vin(vin: &[u8]) -> bool {
    check_vin(vin).is_ok()
}

/// Check that `vout` is a well-formed, length-prefixed output vector.
pub fn validate_vout(vout: &[u8]) -> bool {
    check_vout(vout).is_ok()
}

/// Same as [`validate_vin`], reporting why the vector was rejected.
pub fn check_vin(vin: &[u8]) -> Result<(), VectorError> {
    check_vector::<TxIn>(vin)
}

/// Same as [`validate_vout`], reporting why the vector was rejected.
pub fn check_vout(vout: &[u8]) -> Result<(), VectorError> {
    check_vector::<TxOut>(vout)
}

/// Decode `count` elements of type `T` and require that they consume the vector exactly.
fn check_vector<T: Decodable>(vector: &[u8]) -> Result<(), VectorError> {
    let (&count, mut rest) = vector.split_first().ok_or(VectorError::Empty)?;
    if count == 0 || count > MAX_SINGLE_BYTE_COUNT {
        return Err(VectorError::BadCountPrefix(count));
    }

    let mut consumed = 1;
    for index in 0..count as usize {
        let (_, length) = deserialize_partial::<T>(rest)
            .map_err(|_| VectorError::MalformedElement { index })?;
        rest = &rest[length..];
        consumed += length;
    }

    if consumed != vector.len() {
        return Err(VectorError::TrailingBytes {
            consumed,
            length: vector.len(),
        });
    }
    Ok(())
}
