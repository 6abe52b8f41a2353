//! Bitcoin SPV verification library
//!
//! This crate provides verification routines for SPV proofs: Merkle inclusion, transaction
//! input/output vector structure, block header field consistency, and the orchestration that
//! combines them into a single accept/reject decision.
//!
//! Every routine is a pure function of its inputs. The boolean functions (`validate_*`, `prove`,
//! `verify_hash256_merkle`) are the hot path; the `check_*` / [`verify_spv_proof`] counterparts
//! return a [`SpvError`] naming the first check that failed.

pub mod error;
pub mod hash;
pub mod header;
pub mod merkle;
pub mod proof;
pub mod ser;
pub mod vector;
pub mod verify;

pub use error::{SpvError, Stage, VectorError};
pub use hash::{hash256, Hash256Digest, RawHeader};
pub use header::{check_header, validate_header};
pub use merkle::{check_hash256_merkle, check_prove, prove, verify_hash256_merkle, MerkleTree};
pub use proof::{RelayHeader, SpvProof};
pub use vector::{check_vin, check_vout, validate_vin, validate_vout};
pub use verify::{calculate_txid, validate_spvproof, validate_spvproofs, verify_spv_proof};
