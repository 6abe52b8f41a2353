//! Consistency checks between a block header's raw bytes and its derived fields.
//!
//! Only the header's content is checked. Proof of work, difficulty and timestamps are not.

use tracing::debug;

use crate::error::SpvError;
use crate::hash::{digest_at, hash256, reversed, Hash256Digest, RawHeader};
use crate::proof::RelayHeader;

/// Extract the Merkle root (LE) from a raw header.
pub fn extract_merkle_root_le(raw: &RawHeader) -> Hash256Digest {
    digest_at(raw, 36)
}

/// Extract the previous block's hash (LE) from a raw header.
pub fn extract_prev_block_le(raw: &RawHeader) -> Hash256Digest {
    digest_at(raw, 4)
}

/// Extract the previous block's hash (BE) from a raw header.
pub fn extract_prev_block_be(raw: &RawHeader) -> Hash256Digest {
    reversed(&extract_prev_block_le(raw))
}

/// Check that every derived field of `header` agrees with its raw bytes.
pub fn validate_header(header: &RelayHeader) -> bool {
    check_header(header).is_ok()
}

/// Same as [`validate_header`], reporting the first field that disagrees.
pub fn check_header(header: &RelayHeader) -> Result<(), SpvError> {
    let result = check_header_fields(header);
    if let Err(err) = &result {
        debug!("Header at height {} rejected: {}", header.height, err);
    }
    result
}

fn check_header_fields(header: &RelayHeader) -> Result<(), SpvError> {
    if hash256(&header.raw) != header.hash_le {
        return Err(SpvError::WrongDigest);
    }
    if reversed(&header.hash) != header.hash_le {
        return Err(SpvError::NonMatchingDigests);
    }
    if extract_merkle_root_le(&header.raw) != header.merkle_root_le {
        return Err(SpvError::WrongMerkleRoot);
    }
    if reversed(&header.merkle_root) != header.merkle_root_le {
        return Err(SpvError::NonMatchingMerkleRoots);
    }
    if extract_prev_block_le(&header.raw) != header.prevhash_le {
        return Err(SpvError::WrongPrevHash);
    }
    if reversed(&header.prevhash) != header.prevhash_le {
        return Err(SpvError::NonMatchingPrevHashes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bitcoin mainnet genesis block header
    const GENESIS_RAW: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";
    const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
    const GENESIS_MERKLE_ROOT: &str =
        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    fn genesis() -> RelayHeader {
        let raw: RawHeader = hex::decode(GENESIS_RAW).unwrap().try_into().unwrap();
        RelayHeader::from_raw(raw, 0)
    }

    #[test]
    fn test_extractors() {
        let header = genesis();
        assert_eq!(hex::encode(header.hash), GENESIS_HASH);
        assert_eq!(hex::encode(header.merkle_root), GENESIS_MERKLE_ROOT);
        assert_eq!(extract_prev_block_le(&header.raw), [0u8; 32]);
        assert_eq!(extract_prev_block_be(&header.raw), [0u8; 32]);
        assert_eq!(
            hex::encode(extract_merkle_root_le(&header.raw)),
            "3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a"
        );
    }

    #[test]
    fn test_valid_header() {
        assert!(validate_header(&genesis()));
    }

    #[test]
    fn test_each_field_mutation_is_detected() {
        let cases: [(fn(&mut RelayHeader), SpvError); 7] = [
            (|h: &mut RelayHeader| h.raw[0] ^= 1, SpvError::WrongDigest),
            (|h: &mut RelayHeader| h.hash_le[0] ^= 1, SpvError::WrongDigest),
            (|h: &mut RelayHeader| h.hash[0] ^= 1, SpvError::NonMatchingDigests),
            (|h: &mut RelayHeader| h.merkle_root_le[0] ^= 1, SpvError::WrongMerkleRoot),
            (|h: &mut RelayHeader| h.merkle_root[0] ^= 1, SpvError::NonMatchingMerkleRoots),
            (|h: &mut RelayHeader| h.prevhash_le[0] ^= 1, SpvError::WrongPrevHash),
            (|h: &mut RelayHeader| h.prevhash[0] ^= 1, SpvError::NonMatchingPrevHashes),
        ];

        for (mutate, expected) in cases {
            let mut header = genesis();
            mutate(&mut header);
            assert!(!validate_header(&header));
            assert_eq!(check_header(&header), Err(expected));
        }
    }

    #[test]
    fn test_height_is_not_checked() {
        let mut header = genesis();
        header.height = 840_000;
        assert!(validate_header(&header));
    }
}
