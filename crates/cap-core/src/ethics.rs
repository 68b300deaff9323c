//! Ethics signature: a SHA-256 attestation over a record's canonical form.
//!
//! The signing view is the record without `governance_chain`, `ledger_hash`
//! and `validator_signatures.ethics_signature`. If removing the signature
//! leaves `validator_signatures` empty, the whole object is dropped from the
//! view so a freshly signed record verifies against the digest computed
//! before `validator_signatures` existed.

use cap_canonical::{CapId, Canonicalizer, HexCase, TaggedDigest};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::{content_view, CAP_ID, ETHICS_SIGNATURE, VALIDATOR_SIGNATURES};

/// Errors raised while signing a record.
#[derive(Debug, Error)]
pub enum SignError {
    /// The input record could not be located.
    #[error("source not found: {0}")]
    SourceNotFound(String),
    /// The input is not a JSON object.
    #[error("malformed source: {0}")]
    MalformedSource(String),
    /// The record could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] cap_canonical::CanonicalizationError),
}

/// Outcome of checking a stored ethics signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum SignatureVerdict {
    /// Stored digest matches the recomputed one.
    Valid,
    /// Stored digest differs from the recomputed one.
    Invalid {
        /// Recomputed digest.
        expected: String,
        /// Stored digest.
        actual: String,
    },
    /// The record carries no ethics signature.
    Missing,
}

impl SignatureVerdict {
    /// True only for [`SignatureVerdict::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, SignatureVerdict::Valid)
    }
}

/// The record as it participates in the ethics digest.
pub fn signing_view(record: &Value) -> Value {
    let mut view = content_view(record);
    if let Some(map) = view.as_object_mut() {
        let emptied = match map.get_mut(VALIDATOR_SIGNATURES) {
            Some(Value::Object(sigs)) => {
                sigs.remove(ETHICS_SIGNATURE);
                sigs.is_empty()
            }
            _ => false,
        };
        if emptied {
            map.remove(VALIDATOR_SIGNATURES);
        }
    }
    view
}

/// Computes the ethics digest of `record`.
pub fn compute_ethics_signature(
    record: &Value,
    canonicalizer: &Canonicalizer,
) -> Result<TaggedDigest, SignError> {
    let canonical = canonicalizer.canonicalize(&signing_view(record))?;
    Ok(TaggedDigest::sha256(&canonical.bytes, HexCase::Lower))
}

/// Signs a record.
///
/// Assigns a time-ordered `cap_id` when the record has none, normalizes the
/// record, and stores the digest under
/// `validator_signatures.ethics_signature`. Other validator entries are kept.
/// Given a record that already has a `cap_id`, the result is deterministic.
pub fn sign_record(record: Value, canonicalizer: &Canonicalizer) -> Result<Value, SignError> {
    let Value::Object(mut map) = record else {
        return Err(SignError::MalformedSource(
            "record is not a JSON object".to_string(),
        ));
    };

    let has_id = map
        .get(CAP_ID)
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !has_id {
        let id = CapId::generate();
        tracing::debug!(cap_id = %id, "assigned cap_id");
        map.insert(CAP_ID.to_string(), Value::String(id.to_string()));
    }
    // A non-object entry is replaced below, so it must not reach the digest.
    if map.get(VALIDATOR_SIGNATURES).is_some_and(|s| !s.is_object()) {
        map.remove(VALIDATOR_SIGNATURES);
    }

    let mut signed = canonicalizer.normalize(&Value::Object(map))?;
    let digest = compute_ethics_signature(&signed, canonicalizer)?;

    if let Some(map) = signed.as_object_mut() {
        let sigs = map
            .entry(VALIDATOR_SIGNATURES)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(sigs) = sigs.as_object_mut() {
            sigs.insert(ETHICS_SIGNATURE.to_string(), Value::String(digest.to_string()));
        }
    }

    tracing::info!(signature = %digest, "ethics signature added");
    Ok(signed)
}

/// Recomputes the ethics digest and compares it with the stored one.
pub fn verify_ethics_signature(
    record: &Value,
    canonicalizer: &Canonicalizer,
) -> Result<SignatureVerdict, SignError> {
    if !record.is_object() {
        return Err(SignError::MalformedSource(
            "record is not a JSON object".to_string(),
        ));
    }
    let Some(actual) = record
        .get(VALIDATOR_SIGNATURES)
        .and_then(|s| s.get(ETHICS_SIGNATURE))
        .and_then(Value::as_str)
    else {
        return Ok(SignatureVerdict::Missing);
    };

    let expected = compute_ethics_signature(record, canonicalizer)?.to_string();
    if expected == actual {
        Ok(SignatureVerdict::Valid)
    } else {
        tracing::warn!(%expected, %actual, "ethics signature mismatch");
        Ok(SignatureVerdict::Invalid {
            expected,
            actual: actual.to_string(),
        })
    }
}
