//! CLI wrapper for raw Merkle proof verification

use btcspv_verify::merkle::check_hash256_merkle;
use btcspv_verify::ser::deserialize_hex;
use clap::Args;
use tracing::info;

/// CLI arguments for the `merkle` subcommand
#[derive(Clone, Debug, Args)]
pub struct MerkleArgs {
    /// Hex-encoded proof buffer: leaf, siblings from the bottom up, root
    #[arg(long)]
    proof: String,
    /// 0-based index of the leaf
    #[arg(long, default_value = "0")]
    index: u64,
}

/// Run the `merkle` subcommand: verify a flattened hash256 Merkle proof
pub async fn run(args: MerkleArgs) -> Result<(), anyhow::Error> {
    let proof = deserialize_hex(&args.proof)?;
    check_hash256_merkle(&proof, args.index)?;
    info!(
        "Merkle proof with {} nodes is valid for index {}",
        proof.len() / 32,
        args.index
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use btcspv_verify::{MerkleTree, SpvError};

    fn args(proof: Vec<u8>, index: u64) -> MerkleArgs {
        MerkleArgs {
            proof: format!("0x{}", hex::encode(proof)),
            index,
        }
    }

    #[tokio::test]
    async fn test_valid_proof() {
        let tree = MerkleTree::from_leaves((0..6u8).map(|i| [i; 32]).collect()).unwrap();
        assert!(run(args(tree.proof(4).unwrap(), 4)).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_proof() {
        let tree = MerkleTree::from_leaves((0..6u8).map(|i| [i; 32]).collect()).unwrap();
        let err = run(args(tree.proof(4).unwrap(), 5)).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SpvError>(),
            Some(&SpvError::BadMerkleProof)
        );
    }

    #[tokio::test]
    async fn test_malformed_hex() {
        let args = MerkleArgs {
            proof: "0xabc".to_string(),
            index: 0,
        };
        assert!(run(args).await.is_err());
    }
}
