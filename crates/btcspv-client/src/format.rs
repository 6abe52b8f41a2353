//! Summary cards for terminal display of verification results.

use bitcoin::consensus;
use bitcoin::{Address, Network, TxOut};
use btcspv_verify::{RelayHeader, SpvError, SpvProof};
use chrono::DateTime;

const CARD_WIDTH: usize = 96;

/// Format the outcome of verifying an SPV proof
pub fn format_proof_summary(
    proof: &SpvProof,
    result: &Result<(), SpvError>,
    network: Network,
) -> String {
    let mut lines = vec![
        format!("\x1b[33mTXID:\x1b[0m {}", hex::encode(proof.tx_id)),
        format!("Position in block: {}", proof.index),
        format!("Merkle path depth: {}", proof.depth()),
    ];
    lines.extend(header_lines(&proof.confirming_header));

    // Outputs are only decodable once the vector has been checked
    if !matches!(result, Err(SpvError::InvalidVout(_))) {
        if let Ok(outputs) = consensus::deserialize::<Vec<TxOut>>(&proof.vout) {
            lines.push("\x1b[33mOUTPUTS:\x1b[0m".to_string());
            lines.extend(outputs.iter().map(|txout| format_output(txout, network)));
        }
    }

    lines.push(format_status(result.as_ref().err()));
    format_card("SPV Proof", &lines)
}

/// Format the outcome of checking a standalone header
pub fn format_header_summary(header: &RelayHeader, result: &Result<(), SpvError>) -> String {
    let mut lines = header_lines(header);
    lines.push(format_status(result.as_ref().err()));
    format_card("Block Header", &lines)
}

fn header_lines(header: &RelayHeader) -> Vec<String> {
    let time = u32::from_le_bytes([header.raw[68], header.raw[69], header.raw[70], header.raw[71]]);
    vec![
        format!("Block hash: {}", hex::encode(header.hash)),
        format!("Block height: {}", header.height),
        format!("Previous block: {}", hex::encode(header.prevhash)),
        format!("Merkle root: {}", hex::encode(header.merkle_root)),
        format!("Block timestamp: {}", format_unix_timestamp(time)),
    ]
}

fn format_status(err: Option<&SpvError>) -> String {
    match err {
        None => "\x1b[32mACCEPTED\x1b[0m".to_string(),
        Some(err) => format!("\x1b[31mREJECTED\x1b[0m at {:?} stage: {}", err.stage(), err),
    }
}

fn format_output(txout: &TxOut, network: Network) -> String {
    format!(
        "  {}        {:.8} BTC",
        format_output_address(txout, network),
        txout.value.to_btc()
    )
}

/// Get address string for a transaction output
fn format_output_address(output: &TxOut, network: Network) -> String {
    match Address::from_script(&output.script_pubkey, network) {
        Ok(address) => address.to_string(),
        Err(_) if output.script_pubkey.is_p2pk() => "P2PK".to_string(),
        Err(_) if output.script_pubkey.is_op_return() => "OP_RETURN".to_string(),
        Err(_) => "Unknown".to_string(),
    }
}

fn format_card(title: &str, lines: &[String]) -> String {
    let mut output = String::from("\n");
    let rule = "─".repeat(CARD_WIDTH - title.len() - 3);
    output.push_str(&format!("┌─ {} {}┐\n", title, rule));
    for line in lines {
        output.push_str(&format!("│ {} │\n", format_column_content(line, CARD_WIDTH - 2)));
    }
    output.push_str(&format!("└{}┘\n", "─".repeat(CARD_WIDTH)));
    output
}

/// Format content for a column with proper padding
fn format_column_content(content: &str, width: usize) -> String {
    let visible_len = strip_ansi_codes(content).chars().count();
    if visible_len <= width {
        format!("{}{}", content, " ".repeat(width - visible_len))
    } else {
        content.to_string()
    }
}

/// Remove ANSI color codes from a string for length calculation
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next_c in chars.by_ref() {
                if next_c == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Format Unix timestamp to human-readable string
fn format_unix_timestamp(timestamp: u32) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use btcspv_verify::{Stage, VectorError};

    fn genesis() -> RelayHeader {
        let raw = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";
        RelayHeader::from_raw(hex::decode(raw).unwrap().try_into().unwrap(), 0)
    }

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("\x1b[33mTXID:\x1b[0m abc"), "TXID: abc");
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_unix_timestamp(1_231_006_505), "2009-01-03 18:15:05 UTC");
    }

    #[test]
    fn test_card_rows_have_equal_width() {
        let card = format_header_summary(&genesis(), &Ok(()));
        let widths: Vec<_> = card
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| strip_ansi_codes(line).chars().count())
            .collect();
        assert!(widths.iter().all(|w| *w == CARD_WIDTH + 2), "{:?}", widths);
    }

    #[test]
    fn test_header_summary() {
        let card = format_header_summary(&genesis(), &Ok(()));
        assert!(card.contains("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"));
        assert!(card.contains("2009-01-03 18:15:05 UTC"));
        assert!(card.contains("ACCEPTED"));

        let card = format_header_summary(&genesis(), &Err(SpvError::WrongPrevHash));
        assert!(card.contains("REJECTED"));
        assert!(card.contains("Header stage"));
    }

    #[test]
    fn test_output_amounts() {
        let txout = TxOut {
            value: bitcoin::Amount::from_sat(150_000_001),
            script_pubkey: bitcoin::ScriptBuf::from_bytes(vec![0x6a]),
        };
        let line = format_output(&txout, Network::Bitcoin);
        assert!(line.contains("1.50000001 BTC"), "{}", line);
        assert!(line.contains("OP_RETURN"), "{}", line);
    }

    #[test]
    fn test_proof_summary_rejection() {
        let err = SpvError::InvalidVout(VectorError::Empty);
        assert_eq!(err.stage(), Stage::Vout);
        let proof = SpvProof {
            version: vec![1, 0, 0, 0],
            vin: vec![],
            vout: vec![],
            locktime: vec![0, 0, 0, 0],
            tx_id: [0xaa; 32],
            tx_id_le: [0xaa; 32],
            index: 0,
            intermediate_nodes: vec![],
            confirming_header: genesis(),
        };
        let card = format_proof_summary(&proof, &Err(err), Network::Bitcoin);
        assert!(card.contains(&"aa".repeat(32)));
        assert!(card.contains("REJECTED"));
        assert!(card.contains("Vout stage: Vout is not valid: vector is empty"));
        assert!(!card.contains("OUTPUTS"));
    }
}
