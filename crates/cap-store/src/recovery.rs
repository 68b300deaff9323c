//! Persisted payload recovery.

use crate::codec::encode_record;
use crate::error::StoreError;
use crate::traits::RecordStore;
use cap_canonical::{recover, unwrap_envelope, RecoveryStage};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Result of [`recover_to_store`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryOutcome {
    /// Stage that produced the payload, `None` when the fallback was written.
    pub stage: Option<RecoveryStage>,
    /// The payload that was written.
    pub payload: Value,
}

impl RecoveryOutcome {
    /// True when the `{}` fallback was written.
    pub fn is_fallback(&self) -> bool {
        self.stage.is_none()
    }
}

/// Recovers a CAP payload from raw transport text and writes it to `target`.
///
/// Dispatch envelopes are unwrapped. When no stage recovers an object, the
/// explicit `{}` placeholder is written so downstream steps always find
/// valid JSON. An existing target is backed up first.
pub fn recover_to_store<S: RecordStore + ?Sized>(
    store: &mut S,
    raw: &str,
    target: &Path,
) -> Result<RecoveryOutcome, StoreError> {
    let outcome = match recover(raw).and_then(|r| {
        let stage = r.stage;
        unwrap_envelope(r.into_value()).map(|payload| (stage, payload))
    }) {
        Ok((stage, payload)) => RecoveryOutcome {
            stage: Some(stage),
            payload,
        },
        Err(failure) => {
            tracing::warn!(error = %failure, "payload unrecoverable; writing empty fallback");
            RecoveryOutcome {
                stage: None,
                payload: failure.fallback(),
            }
        }
    };

    let bytes = encode_record(&outcome.payload)?;
    match store.backup(target) {
        Ok(_) | Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }
    store.write(target, &bytes)?;
    tracing::info!(target = %target.display(), stage = ?outcome.stage, "recovered payload written");
    Ok(outcome)
}
