//! Error types describing why an SPV proof, header, vector, or Merkle proof was rejected.

use thiserror::Error;

/// Stage of proof verification at which a check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Transaction input vector structure
    Vin,
    /// Transaction output vector structure
    Vout,
    /// Transaction identifier recomputation
    TxId,
    /// Confirming header field consistency
    Header,
    /// Merkle inclusion of the transaction
    Merkle,
}

/// Reasons a length-prefixed input or output vector is malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// The vector has no bytes at all
    #[error("vector is empty")]
    Empty,
    /// The count prefix is zero or not a single-byte VarInt
    #[error("count prefix {0:#04x} is outside 0x01..=0xfc")]
    BadCountPrefix(u8),
    /// An element could not be decoded from the remaining bytes
    #[error("element {index} is malformed or truncated")]
    MalformedElement { index: usize },
    /// All elements decoded, but the vector has bytes left over
    #[error("elements consume {consumed} of {length} bytes")]
    TrailingBytes { consumed: usize, length: usize },
}

/// Error types for SPV proof verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpvError {
    /// The input vector is malformed
    #[error("Vin is not valid: {0}")]
    InvalidVin(VectorError),
    /// The output vector is malformed
    #[error("Vout is not valid: {0}")]
    InvalidVout(VectorError),
    /// Version, vin, vout and locktime do not hash to the claimed transaction id
    #[error("Version, Vin, Vout and Locktime did not yield correct TxID")]
    WrongTxId,
    /// `hash_le` is not the digest of the raw header
    #[error("Hash LE is not the correct hash of the header")]
    WrongDigest,
    /// `hash` is not the byte-reversal of `hash_le`
    #[error("HashLE is not the LE version of Hash")]
    NonMatchingDigests,
    /// `merkle_root_le` is not the root committed to by the raw header
    #[error("MerkleRootLE is not the correct merkle root of the header")]
    WrongMerkleRoot,
    /// `merkle_root` is not the byte-reversal of `merkle_root_le`
    #[error("MerkleRootLE is not the LE version of MerkleRoot")]
    NonMatchingMerkleRoots,
    /// `prevhash_le` is not the parent digest committed to by the raw header
    #[error("PrevHashLE is not the correct previous hash of the header")]
    WrongPrevHash,
    /// `prevhash` is not the byte-reversal of `prevhash_le`
    #[error("PrevHashLE is not the LE version of PrevHash")]
    NonMatchingPrevHashes,
    /// The Merkle proof buffer length is not a multiple of 32
    #[error("Merkle proof length {0} is not a multiple of 32")]
    MerkleProofLength(usize),
    /// The Merkle proof holds a leaf and a root with no way to combine them
    #[error("Merkle proof holds a leaf and a root but no path between them")]
    MalformedMerkleProof,
    /// The Merkle proof buffer is empty
    #[error("Merkle proof is empty")]
    EmptyMerkleProof,
    /// The recomputed Merkle root does not match the claimed root
    #[error("Merkle proof is not valid")]
    BadMerkleProof,
}

impl SpvError {
    /// Verification stage the error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            SpvError::InvalidVin(_) => Stage::Vin,
            SpvError::InvalidVout(_) => Stage::Vout,
            SpvError::WrongTxId => Stage::TxId,
            SpvError::WrongDigest
            | SpvError::NonMatchingDigests
            | SpvError::WrongMerkleRoot
            | SpvError::NonMatchingMerkleRoots
            | SpvError::WrongPrevHash
            | SpvError::NonMatchingPrevHashes => Stage::Header,
            SpvError::MerkleProofLength(_)
            | SpvError::MalformedMerkleProof
            | SpvError::EmptyMerkleProof
            | SpvError::BadMerkleProof => Stage::Merkle,
        }
    }

    /// Whether the error signals a caller bug rather than adversarial or corrupt data
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, SpvError::EmptyMerkleProof)
    }
}
