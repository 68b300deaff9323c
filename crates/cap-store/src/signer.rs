//! Persisted ethics signing.

use crate::codec::encode_record;
use crate::error::StoreError;
use crate::traits::RecordStore;
use cap_canonical::Canonicalizer;
use cap_core::{sign_record, verify_ethics_signature, CoreError, SignError, SignatureVerdict};
use serde_json::Value;
use std::path::Path;

fn load_source<S: RecordStore + ?Sized>(store: &S, path: &Path) -> Result<Value, StoreError> {
    let stored = match store.read(path) {
        Ok(stored) => stored,
        Err(StoreError::NotFound(_)) => {
            let missing = SignError::SourceNotFound(path.display().to_string());
            return Err(CoreError::from(missing).into());
        }
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&stored.bytes).map_err(|e| {
        CoreError::from(SignError::MalformedSource(format!("{}: {}", path.display(), e))).into()
    })
}

/// Signs the record at `source` and writes it to `target`, or back to
/// `source` when no target is given.
///
/// An existing target is backed up first. Returns the signed record.
///
/// # Errors
///
/// `SourceNotFound` when `source` does not exist and `MalformedSource` when
/// it is not a JSON object; nothing is written in either case.
pub fn sign_stored<S: RecordStore + ?Sized>(
    store: &mut S,
    source: &Path,
    target: Option<&Path>,
    canonicalizer: &Canonicalizer,
) -> Result<Value, StoreError> {
    let record = load_source(store, source)?;
    let signed = sign_record(record, canonicalizer).map_err(CoreError::from)?;
    let bytes = encode_record(&signed)?;

    let target = target.unwrap_or(source);
    match store.backup(target) {
        Ok(_) | Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }
    store.write(target, &bytes)?;
    tracing::info!(source = %source.display(), target = %target.display(), "signed record written");
    Ok(signed)
}

/// Checks the ethics signature of the record at `path`.
pub fn verify_stored<S: RecordStore + ?Sized>(
    store: &S,
    path: &Path,
    canonicalizer: &Canonicalizer,
) -> Result<SignatureVerdict, StoreError> {
    let record = load_source(store, path)?;
    verify_ethics_signature(&record, canonicalizer)
        .map_err(|e| StoreError::from(CoreError::from(e)))
}
