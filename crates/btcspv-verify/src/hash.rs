//! Double-SHA256 hashing and byte-order helpers shared by the validators.

use bitcoin::hashes::{sha256d, Hash, HashEngine};

/// A 32-byte double-SHA256 digest
pub type Hash256Digest = [u8; 32];

/// A canonical 80-byte serialized block header
pub type RawHeader = [u8; 80];

/// Bitcoin's hash256: SHA256 applied twice.
pub fn hash256(preimage: &[u8]) -> Hash256Digest {
    sha256d::Hash::hash(preimage).to_byte_array()
}

/// hash256 over the concatenation of `preimages`, without allocating the joined buffer.
pub fn hash256_concat(preimages: &[&[u8]]) -> Hash256Digest {
    let mut engine = sha256d::Hash::engine();
    for preimage in preimages {
        engine.input(preimage);
    }
    sha256d::Hash::from_engine(engine).to_byte_array()
}

/// Concatenate two nodes and hash them into their parent.
pub fn hash256_merkle_step(left: &[u8], right: &[u8]) -> Hash256Digest {
    hash256_concat(&[left, right])
}

/// Return a byte-reversed copy of a digest (LE <-> BE).
pub fn reversed(digest: &Hash256Digest) -> Hash256Digest {
    let mut out = *digest;
    out.reverse();
    out
}

/// Copy a 32-byte window out of `bytes` starting at `offset`.
///
/// Panics if the window is out of bounds; callers only use it on fixed-size buffers.
pub(crate) fn digest_at(bytes: &[u8], offset: usize) -> Hash256Digest {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&bytes[offset..offset + 32]);
    digest
}
