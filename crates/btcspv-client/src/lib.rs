//! SPV proof client library
//!
//! Assembles SPV proofs for Bitcoin transactions from a Bitcoin node, stores them as JSON,
//! and verifies stored proofs, headers and raw Merkle proofs.

pub mod fetch;
pub mod format;
pub mod header;
pub mod merkle;
pub mod verify;

pub use fetch::{
    build_spv_proof, check_header_chain, fetch_confirmations, fetch_spv_proof, load_json,
    save_json, ProofAssemblyError,
};
