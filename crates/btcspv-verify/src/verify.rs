//! Verification of a complete SPV proof: input and output vectors, transaction id,
//! confirming header, and Merkle inclusion of the transaction in that header.

use tracing::debug;

use crate::error::SpvError;
use crate::hash::{hash256_concat, Hash256Digest};
use crate::header::check_header;
use crate::merkle::check_prove;
use crate::proof::SpvProof;
use crate::vector::{check_vin, check_vout};

/// Hash the legacy transaction serialization to get its id (LE).
///
/// - `version`: 4-byte version
/// - `vin`: length-prefixed input vector
/// - `vout`: length-prefixed output vector
/// - `locktime`: 4-byte locktime
pub fn calculate_txid(version: &[u8], vin: &[u8], vout: &[u8], locktime: &[u8]) -> Hash256Digest {
    hash256_concat(&[version, vin, vout, locktime])
}

/// Accept or reject an SPV proof.
pub fn validate_spvproof(proof: &SpvProof) -> bool {
    verify_spv_proof(proof).is_ok()
}

/// Validate a batch of independent proofs, preserving order.
pub fn validate_spvproofs(proofs: &[SpvProof]) -> Vec<bool> {
    proofs.iter().map(validate_spvproof).collect()
}

/// Verify an SPV proof, returning the first check that failed.
///
/// Checks, in order: the input vector, the output vector, the transaction id recomputed from
/// the raw components, the confirming header's field consistency, and the Merkle path from the
/// transaction id to the header's Merkle root.
pub fn verify_spv_proof(proof: &SpvProof) -> Result<(), SpvError> {
    let result = verify_spv_proof_stages(proof);
    match &result {
        Ok(()) => debug!(
            "SPV proof for {} verified at height {}",
            hex::encode(proof.tx_id),
            proof.confirming_header.height
        ),
        Err(err) => debug!(
            "SPV proof for {} rejected at {:?} stage: {}",
            hex::encode(proof.tx_id),
            err.stage(),
            err
        ),
    }
    result
}

fn verify_spv_proof_stages(proof: &SpvProof) -> Result<(), SpvError> {
    let SpvProof {
        version,
        vin,
        vout,
        locktime,
        tx_id: _,
        tx_id_le,
        index,
        intermediate_nodes,
        confirming_header,
    } = proof;

    debug!("Verifying input and output vectors ...");
    check_vin(vin).map_err(SpvError::InvalidVin)?;
    check_vout(vout).map_err(SpvError::InvalidVout)?;

    debug!("Verifying transaction id ...");
    if calculate_txid(version, vin, vout, locktime) != *tx_id_le {
        return Err(SpvError::WrongTxId);
    }

    debug!("Verifying confirming header ...");
    check_header(confirming_header)?;

    debug!("Verifying transaction inclusion proof ...");
    check_prove(
        *tx_id_le,
        confirming_header.merkle_root_le,
        intermediate_nodes,
        *index,
    )
}
