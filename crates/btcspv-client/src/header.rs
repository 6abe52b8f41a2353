//! CLI wrapper for standalone header validation

use btcspv_verify::{check_header, RelayHeader};
use clap::Args;
use std::path::PathBuf;

use crate::fetch::load_json;
use crate::format::format_header_summary;

/// CLI arguments for the `header` subcommand
#[derive(Clone, Debug, Args)]
pub struct HeaderArgs {
    /// Path to read the header record from
    #[arg(long)]
    header_path: PathBuf,
}

/// Run the `header` subcommand: check a header record's derived fields against its raw bytes
pub async fn run(args: HeaderArgs) -> Result<(), anyhow::Error> {
    let header: RelayHeader = load_json(&args.header_path)?;
    let result = check_header(&header);
    println!("{}", format_header_summary(&header, &result));
    Ok(result?)
}
