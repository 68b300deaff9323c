//! Canonicalize command implementation.

use super::read_input;
use cap_canonical::Canonicalizer;
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn run(input: Option<PathBuf>, report: bool) -> Result<(), Box<dyn std::error::Error>> {
    let canonicalizer = Canonicalizer::v1();

    let bytes = read_input(input.as_deref())?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("Invalid JSON: {}", e))?;

    let result = canonicalizer
        .canonicalize(&value)
        .map_err(|e| format!("Canonicalization failed: {}", e))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&result.bytes)?;
    stdout.write_all(b"\n")?;

    if report {
        eprintln!("{}", serde_json::to_string_pretty(&result.report)?);
    }
    Ok(())
}
