//! Canonical data model primitives for CAP ledger records.
//!
//! Everything that decides which bytes get hashed lives in this crate:
//! the canonicalizer, tagged digests, record identifiers, and the payload
//! recoverer that turns lossy transport text back into a JSON object before
//! any hashing happens.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// Tagged digest primitives.
pub mod digest;
/// Hygiene report types emitted during canonicalization.
pub mod hygiene;
/// Record identifiers and timestamp newtypes.
pub mod identifiers;
/// Multi-stage recovery of malformed payload text.
pub mod recovery;
/// Validation helpers used by canonical types.
pub mod validation;

pub use canonicalizer::{CanonicalizationError, CanonicalizationResult, Canonicalizer};
pub use digest::{DigestAlg, HexCase, TaggedDigest};
pub use hygiene::{HygieneReport, HygieneStatus, HygieneWarning};
pub use identifiers::{CapId, ProfileId, Timestamp};
pub use recovery::{recover, unwrap_envelope, Recovered, RecoveryFailure, RecoveryStage};
pub use validation::ValidationError;

/// Default canonicalization profile.
pub const PROFILE_V1: &str = "cap-canonical-v1";
