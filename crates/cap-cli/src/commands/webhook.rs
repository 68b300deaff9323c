//! Webhook signing and verification commands.

use crate::error::CheckFailed;
use cap_core::{compute_signature, verify_signature, LedgerConfig};
use std::path::{Path, PathBuf};

fn read_body(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("Failed to read file {}: {}", path.display(), e))
}

pub fn sign(config: &LedgerConfig, body: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let secret = config.require_secret()?;
    let body = read_body(&body)?;
    println!("{}", compute_signature(secret.expose(), &body));
    Ok(())
}

pub fn verify(
    config: &LedgerConfig,
    body: PathBuf,
    signature: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let secret = config.require_secret()?;
    let body = read_body(&body)?;
    if verify_signature(secret.expose(), &body, Some(&signature)) {
        println!("VALID");
        Ok(())
    } else {
        println!("INVALID");
        Err(CheckFailed::Webhook.into())
    }
}
