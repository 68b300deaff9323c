use crate::identifiers::ProfileId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hygiene status for canonicalization attempts.
///
/// Variants are ordered by severity; a report only ever moves to a more
/// severe status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HygieneStatus {
    /// The input was already in canonical form.
    Ok,
    /// Whitespace normalization changed at least one string.
    Ambiguous,
    /// At least one number lost precision to rounding.
    Lossy,
    /// The input was invalid and must be rejected.
    Invalid,
}

/// Stable warning code emitted by canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HygieneWarning(String);

impl HygieneWarning {
    /// Creates a warning from a literal code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Warning code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

/// Hygiene reports produced during canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneReport {
    /// Overall hygiene status.
    pub status: HygieneStatus,
    /// Stable warning codes, each listed once.
    pub warnings: Vec<HygieneWarning>,
    /// Counters such as `numbers_rounded`.
    pub metrics: BTreeMap<String, u64>,
    /// Identifier of the canonicalization profile that produced the bytes.
    pub profile_id: ProfileId,
}

impl HygieneReport {
    /// Records one normalization event.
    pub(crate) fn record(&mut self, status: HygieneStatus, warning: &str, metric: &str) {
        self.status = self.status.max(status);
        if !self.warnings.iter().any(|w| w.code() == warning) {
            self.warnings.push(HygieneWarning::new(warning));
        }
        *self.metrics.entry(metric.to_string()).or_insert(0) += 1;
    }

    /// True when canonicalization changed nothing.
    pub fn is_clean(&self) -> bool {
        self.status == HygieneStatus::Ok
    }
}
