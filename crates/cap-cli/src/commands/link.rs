//! Link and verify-chain command implementations.

use super::corpus_root;
use crate::error::CheckFailed;
use crate::output::{self, truncate};
use cap_canonical::Canonicalizer;
use cap_core::{ChainStatus, LedgerConfig};
use cap_store::{link_corpus, verify_corpus, FsRecordStore};
use serde_json::json;
use std::path::PathBuf;

pub fn run(
    config: &LedgerConfig,
    root: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = corpus_root(config, root);
    let mut store = FsRecordStore::new();
    let report = link_corpus(&mut store, &root, &Canonicalizer::v1())
        .map_err(|e| format!("Failed to link {}: {}", root.display(), e))?;

    if json {
        output::print_json(&json!({
            "records": report.records,
            "rewritten": report.rewritten,
            "unchanged": report.unchanged(),
        }))?;
    } else {
        for path in &report.rewritten {
            println!("linked    {}", path.display());
        }
        println!(
            "{} records, {} rewritten, {} unchanged",
            report.records,
            report.rewritten.len(),
            report.unchanged()
        );
    }
    Ok(())
}

pub fn verify(
    config: &LedgerConfig,
    root: Option<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = corpus_root(config, root);
    let store = FsRecordStore::new();
    let report = verify_corpus(&store, &root, &Canonicalizer::v1())
        .map_err(|e| format!("Failed to verify {}: {}", root.display(), e))?;

    if json {
        output::print_json(&report)?;
    } else {
        println!("{:<6} {:<10} {:<40} {}", "POS", "FIELD", "RECORD", "EXPECTED");
        println!("{}", "-".repeat(100));
        for b in &report.breaks {
            println!(
                "{:<6} {:<10} {:<40} {}",
                b.position,
                b.field,
                truncate(&b.id, 40),
                b.expected
            );
        }
        println!("status: {:?} ({} records)", report.status, report.records);
    }

    if strict && report.status == ChainStatus::Broken {
        return Err(CheckFailed::Chain(report.breaks.len()).into());
    }
    Ok(())
}
