//! Check-ledger command implementation.

use crate::error::CheckFailed;
use crate::fetch::HttpFetcher;
use crate::output;
use cap_core::{check_artifact, verify_remote, IntegrityVerdict, LedgerConfig};

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub fn run(
    config: &LedgerConfig,
    source: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = source
        .or_else(|| config.ledger_url.clone())
        .ok_or(CheckFailed::Missing("ledger URL"))?;

    let verdict = if is_remote(&source) {
        let fetcher = HttpFetcher::new(config.fetch_timeout)?;
        verify_remote(&fetcher, &source)?
    } else {
        let bytes = std::fs::read(&source)
            .map_err(|e| format!("Failed to read file {}: {}", source, e))?;
        check_artifact(&bytes)
    };

    if json {
        output::print_json(&verdict)?;
    } else {
        match &verdict {
            IntegrityVerdict::Match { address } => println!("MATCH {}", address),
            IntegrityVerdict::Mismatch { expected, actual } => {
                println!("MISMATCH");
                println!("  expected: {}", expected);
                println!("  actual:   {}", actual);
            }
            IntegrityVerdict::Skipped => println!("SKIPPED (no ledger_hash present)"),
        }
    }

    match verdict {
        IntegrityVerdict::Mismatch { expected, actual } => {
            Err(CheckFailed::Ledger { expected, actual }.into())
        }
        _ => Ok(()),
    }
}
