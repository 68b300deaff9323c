//! Recover command implementation.

use super::read_input;
use crate::output;
use cap_canonical::{recover, unwrap_envelope};
use cap_store::{recover_to_store, FsRecordStore};
use std::path::PathBuf;

pub fn run(input: Option<PathBuf>, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(input.as_deref())?;
    let raw = String::from_utf8_lossy(&bytes);

    if let Some(target) = out {
        let mut store = FsRecordStore::new();
        let outcome = recover_to_store(&mut store, &raw, &target)?;
        match outcome.stage {
            Some(stage) => eprintln!("Recovered payload ({:?}) -> {}", stage, target.display()),
            None => eprintln!("Payload unrecoverable; wrote {{}} -> {}", target.display()),
        }
        return Ok(());
    }

    let payload = match recover(&raw).and_then(|r| unwrap_envelope(r.into_value())) {
        Ok(payload) => payload,
        Err(failure) => {
            tracing::warn!(error = %failure, "payload unrecoverable; emitting empty fallback");
            failure.fallback()
        }
    };
    output::print_json(&payload)?;
    Ok(())
}
