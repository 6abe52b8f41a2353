//! CLI wrapper for the verify functionality

use bitcoin::Network;
use btcspv_verify::{verify_spv_proof, SpvProof};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::fetch::load_json;
use crate::format::format_proof_summary;

/// CLI arguments for the `verify` subcommand
#[derive(Clone, Debug, Args)]
pub struct VerifyArgs {
    /// Paths to read the proofs from
    #[arg(long, required = true, num_args = 1..)]
    proof_path: Vec<PathBuf>,
    /// Network used to render output addresses
    #[arg(long, default_value = "bitcoin")]
    network: Network,
}

/// Run the `verify` subcommand: read proofs from disk and verify each of them
///
/// Every proof is verified and reported; the command fails if any was rejected.
pub async fn run(args: VerifyArgs) -> Result<(), anyhow::Error> {
    let proofs = args
        .proof_path
        .iter()
        .map(|path| load_json::<SpvProof>(path))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rejected = 0;
    for proof in &proofs {
        let result = verify_spv_proof(proof);
        if result.is_err() {
            rejected += 1;
        }
        println!("{}", format_proof_summary(proof, &result, args.network));
    }

    if rejected > 0 {
        anyhow::bail!("{} of {} proofs rejected", rejected, proofs.len());
    }
    info!("{} proofs verified", proofs.len());
    Ok(())
}
