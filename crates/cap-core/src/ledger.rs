//! Bit-for-bit tamper detection of persisted record artifacts.
//!
//! The external ledger addresses artifacts the way git addresses blobs:
//! `SHA1("blob " + <byte length> + "\0" + bytes)` in lowercase hex. The hash
//! covers the stored bytes, not a re-canonicalized form, so any byte change
//! (including reformatting) is a mismatch.

use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::record::LEDGER_HASH;

/// Content address of `bytes` in the external ledger's scheme.
pub fn content_address(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Result of an integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum IntegrityVerdict {
    /// Recomputed address equals the stored one.
    Match {
        /// The shared address.
        address: String,
    },
    /// Recomputed address differs from the stored one.
    Mismatch {
        /// Stored address.
        expected: String,
        /// Recomputed address.
        actual: String,
    },
    /// No stored address yet; the record has not completed external attestation.
    Skipped,
}

/// Compares the address of `fetched` with `stored`.
pub fn check_integrity(fetched: &[u8], stored: Option<&str>) -> IntegrityVerdict {
    let Some(expected) = stored else {
        tracing::info!("no ledger_hash present; skipping integrity check");
        return IntegrityVerdict::Skipped;
    };
    let actual = content_address(fetched);
    if actual == expected {
        IntegrityVerdict::Match { address: actual }
    } else {
        tracing::warn!(%expected, %actual, "ledger hash mismatch");
        IntegrityVerdict::Mismatch {
            expected: expected.to_string(),
            actual,
        }
    }
}

/// Checks an artifact against the `ledger_hash` it carries itself.
///
/// An artifact that is not a JSON object, or has no string `ledger_hash`,
/// is [`IntegrityVerdict::Skipped`].
pub fn check_artifact(fetched: &[u8]) -> IntegrityVerdict {
    let stored = serde_json::from_slice::<Value>(fetched)
        .ok()
        .and_then(|v| v.get(LEDGER_HASH).and_then(Value::as_str).map(str::to_string));
    check_integrity(fetched, stored.as_deref())
}

/// Error returned by an [`ArtifactFetcher`].
#[derive(Debug, Error)]
#[error("fetch of {url} failed: {reason}")]
pub struct FetchError {
    /// Requested location.
    pub url: String,
    /// Failure description.
    pub reason: String,
}

/// Single-shot retrieval of a stored artifact. No retry is implied.
pub trait ArtifactFetcher {
    /// Returns the raw bytes at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `url` once and checks it against its embedded `ledger_hash`.
pub fn verify_remote<F: ArtifactFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
) -> Result<IntegrityVerdict, FetchError> {
    let bytes = fetcher.fetch(url)?;
    Ok(check_artifact(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_git_blob_ids() {
        // `git hash-object` of an empty file and of "hello\n".
        assert_eq!(content_address(b""), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
        assert_eq!(
            content_address(b"hello\n"),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }
}
