//! Functions to fetch the block containing a transaction from a Bitcoin node and assemble
//! an SPV proof for it.

use std::path::{Path, PathBuf};

use bitcoin::hashes::Hash;
use bitcoin::{Block, Txid};
use btcspv_bitcoin_client::BitcoinClient;
use btcspv_verify::{check_header, verify_spv_proof, MerkleTree, RelayHeader, SpvProof};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Reasons a proof cannot be assembled from a block
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProofAssemblyError {
    /// The block does not contain the transaction
    #[error("Transaction {0} is not in the block")]
    TransactionNotFound(Txid),
    /// The block's transactions do not hash to the root in its header
    #[error("Transactions of block {0} do not match its Merkle root")]
    MerkleRootMismatch(bitcoin::BlockHash),
    /// The chain tip is not far enough above the confirming block
    #[error("Block {height} has {available} confirmations, {required} required")]
    InsufficientConfirmations {
        height: u32,
        available: u32,
        required: u32,
    },
    /// A confirmation header is inconsistent or does not extend its predecessor
    #[error("Header at height {0} does not extend the confirming chain")]
    BrokenHeaderChain(u32),
}

/// CLI arguments for the `fetch` subcommand
#[derive(Clone, Debug, clap::Args)]
pub struct FetchArgs {
    /// Transaction ID
    #[arg(long)]
    txid: Txid,
    /// Path to save the proof
    #[arg(long)]
    proof_path: PathBuf,
    /// Bitcoin RPC URL
    #[arg(long, env = "BITCOIN_RPC")]
    bitcoin_rpc_url: String,
    /// Bitcoin RPC user:password (optional)
    #[arg(long, env = "USERPWD")]
    bitcoin_rpc_userpwd: Option<String>,
    /// Verify the proof after fetching it
    #[arg(long, default_value = "false")]
    verify: bool,
    /// Number of headers required on top of the confirming block
    #[arg(long, default_value = "0")]
    confirmations: u32,
}

/// Run the `fetch` subcommand: assemble a proof and write it to disk as JSON
///
/// Returns an error if any network request fails, the proof cannot be written
/// to the specified path, or verification was requested and failed.
pub async fn run(args: FetchArgs) -> Result<(), anyhow::Error> {
    let bitcoin_client = BitcoinClient::new(args.bitcoin_rpc_url, args.bitcoin_rpc_userpwd)?;
    let proof = fetch_spv_proof(&bitcoin_client, args.txid)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch SPV proof: {}", e))?;

    if args.confirmations > 0 {
        fetch_confirmations(&bitcoin_client, &proof.confirming_header, args.confirmations)
            .await?;
        info!(
            "Block {} has at least {} confirmations",
            proof.confirming_header.height, args.confirmations
        );
    }

    save_json(&proof, &args.proof_path)?;
    info!("Proof written to {}", args.proof_path.display());

    if args.verify {
        verify_spv_proof(&proof)?;
        info!("Proof for {} verified", args.txid);
    }

    Ok(())
}

/// Fetch the block containing `txid` and assemble an SPV proof for the transaction
pub async fn fetch_spv_proof(
    bitcoin_client: &BitcoinClient,
    txid: Txid,
) -> Result<SpvProof, anyhow::Error> {
    info!("Looking up the block containing {} ...", txid);
    let block_hash = bitcoin_client.get_transaction_block_hash(&txid).await?;

    info!("Fetching block {} ...", block_hash);
    let block = bitcoin_client.get_block(&block_hash).await?;
    let block_height = bitcoin_client.get_block_header_ex(&block_hash).await?.height;

    info!(
        "Building Merkle branch over {} transactions ...",
        block.txdata.len()
    );
    Ok(build_spv_proof(&block, block_height as u32, &txid)?)
}

/// Fetch the `count` headers built on top of `confirming_header` and check that they chain.
///
/// Returns the headers in height order.
pub async fn fetch_confirmations(
    bitcoin_client: &BitcoinClient,
    confirming_header: &RelayHeader,
    count: u32,
) -> Result<Vec<RelayHeader>, anyhow::Error> {
    let tip = bitcoin_client.get_block_count().await?;
    let available = tip.saturating_sub(confirming_header.height);
    if available < count {
        return Err(ProofAssemblyError::InsufficientConfirmations {
            height: confirming_header.height,
            available,
            required: count,
        }
        .into());
    }

    info!("Fetching {} confirmation headers ...", count);
    let mut headers = Vec::with_capacity(count as usize);
    for height in confirming_header.height + 1..=confirming_header.height + count {
        let hash = bitcoin_client.get_block_hash(height).await?;
        let header = bitcoin_client.get_block_header(&hash).await?;
        headers.push(RelayHeader::from_block_header(&header, height));
    }

    check_header_chain(confirming_header, &headers)?;
    Ok(headers)
}

/// Check that each header is internally consistent and commits to its predecessor
pub fn check_header_chain(
    confirming_header: &RelayHeader,
    headers: &[RelayHeader],
) -> Result<(), ProofAssemblyError> {
    let mut previous = confirming_header;
    for header in headers {
        if check_header(header).is_err() || header.prevhash_le != previous.hash_le {
            return Err(ProofAssemblyError::BrokenHeaderChain(header.height));
        }
        previous = header;
    }
    Ok(())
}

/// Assemble an SPV proof for `txid` from the full block that contains it
pub fn build_spv_proof(
    block: &Block,
    height: u32,
    txid: &Txid,
) -> Result<SpvProof, ProofAssemblyError> {
    let txids: Vec<Txid> = block.txdata.iter().map(|tx| tx.compute_txid()).collect();
    let index = txids
        .iter()
        .position(|id| id == txid)
        .ok_or(ProofAssemblyError::TransactionNotFound(*txid))?;

    let leaves = txids.iter().map(|id| id.to_byte_array()).collect();
    let tree =
        MerkleTree::from_leaves(leaves).ok_or(ProofAssemblyError::TransactionNotFound(*txid))?;
    if tree.root() != block.header.merkle_root.to_byte_array() {
        return Err(ProofAssemblyError::MerkleRootMismatch(
            block.header.block_hash(),
        ));
    }

    let intermediate_nodes = tree
        .branch(index)
        .ok_or(ProofAssemblyError::TransactionNotFound(*txid))?;
    let confirming_header = RelayHeader::from_block_header(&block.header, height);

    Ok(SpvProof::from_transaction(
        &block.txdata[index],
        index as u64,
        intermediate_nodes,
        confirming_header,
    ))
}

/// Write a record to disk as pretty-printed JSON, creating parent directories as needed
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), anyhow::Error> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON record from disk
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, anyhow::Error> {
    info!("Loading {}", path.display());
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
}
