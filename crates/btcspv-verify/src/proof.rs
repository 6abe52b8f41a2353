//! Types representing an SPV proof and its confirming header, as exchanged between the
//! component that assembles a proof and the one that verifies it.

use bitcoin::block::Header as BlockHeader;
use bitcoin::consensus;
use bitcoin::hashes::Hash;
use bitcoin::Transaction;
use serde::{Deserialize, Serialize};

use crate::hash::{hash256, reversed, Hash256Digest, RawHeader};
use crate::header::{extract_merkle_root_le, extract_prev_block_le};
use crate::ser::{hex_array, hex_bytes};

/// A Bitcoin block header together with its derived fields
///
/// The derived fields are redundant with `raw`; whether they agree is checked by
/// [`crate::validate_header`], not enforced on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayHeader {
    /// The 80-byte serialized header
    #[serde(with = "hex_array")]
    pub raw: RawHeader,
    /// Header digest, display (BE) order
    #[serde(with = "hex_array")]
    pub hash: Hash256Digest,
    /// Header digest, internal (LE) order
    #[serde(with = "hex_array")]
    pub hash_le: Hash256Digest,
    /// Height of the block (informational)
    pub height: u32,
    /// Digest of the parent block, BE
    #[serde(with = "hex_array")]
    pub prevhash: Hash256Digest,
    /// Digest of the parent block, LE
    #[serde(with = "hex_array")]
    pub prevhash_le: Hash256Digest,
    /// Transaction Merkle root, BE
    #[serde(with = "hex_array")]
    pub merkle_root: Hash256Digest,
    /// Transaction Merkle root, LE
    #[serde(with = "hex_array")]
    pub merkle_root_le: Hash256Digest,
}

impl RelayHeader {
    /// Derive every field from the raw header bytes.
    pub fn from_raw(raw: RawHeader, height: u32) -> Self {
        let hash_le = hash256(&raw);
        let prevhash_le = extract_prev_block_le(&raw);
        let merkle_root_le = extract_merkle_root_le(&raw);
        Self {
            raw,
            hash: reversed(&hash_le),
            hash_le,
            height,
            prevhash: reversed(&prevhash_le),
            prevhash_le,
            merkle_root: reversed(&merkle_root_le),
            merkle_root_le,
        }
    }

    /// Build the record from a decoded block header.
    pub fn from_block_header(header: &BlockHeader, height: u32) -> Self {
        let mut raw = [0u8; 80];
        raw.copy_from_slice(&consensus::serialize(header));
        Self::from_raw(raw, height)
    }
}

/// An inclusion claim: a transaction, its Merkle path, and the header it is confirmed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpvProof {
    /// The 4-byte LE transaction version
    #[serde(with = "hex_bytes")]
    pub version: Vec<u8>,
    /// The length-prefixed input vector
    #[serde(with = "hex_bytes")]
    pub vin: Vec<u8>,
    /// The length-prefixed output vector
    #[serde(with = "hex_bytes")]
    pub vout: Vec<u8>,
    /// The 4-byte LE locktime
    #[serde(with = "hex_bytes")]
    pub locktime: Vec<u8>,
    /// Transaction id, BE
    #[serde(with = "hex_array")]
    pub tx_id: Hash256Digest,
    /// Transaction id, LE
    #[serde(with = "hex_array")]
    pub tx_id_le: Hash256Digest,
    /// 0-based position of the transaction in the block
    pub index: u64,
    /// Sibling digests between the transaction and the Merkle root, bottom-up
    #[serde(with = "hex_bytes")]
    pub intermediate_nodes: Vec<u8>,
    /// Header of the block that includes the transaction
    pub confirming_header: RelayHeader,
}

impl SpvProof {
    /// Assemble a proof for `transaction` from its Merkle path and confirming header.
    ///
    /// Witness data is dropped: the transaction id commits to the legacy serialization only.
    pub fn from_transaction(
        transaction: &Transaction,
        index: u64,
        intermediate_nodes: Vec<u8>,
        confirming_header: RelayHeader,
    ) -> Self {
        let tx_id_le = transaction.compute_txid().to_byte_array();
        Self {
            version: consensus::serialize(&transaction.version),
            vin: consensus::serialize(&transaction.input),
            vout: consensus::serialize(&transaction.output),
            locktime: consensus::serialize(&transaction.lock_time),
            tx_id: reversed(&tx_id_le),
            tx_id_le,
            index,
            intermediate_nodes,
            confirming_header,
        }
    }

    /// Number of sibling levels in the Merkle path
    pub fn depth(&self) -> usize {
        self.intermediate_nodes.len() / 32
    }
}
