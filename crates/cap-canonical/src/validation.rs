use thiserror::Error;

/// Errors raised when parsing identifiers and tagged digests.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The value does not match the identifier's pattern.
    #[error("{field} ('{value}') is not allowed")]
    PatternMismatch {
        /// Field name that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// A tagged digest has no `ALG:` prefix.
    #[error("'{0}' is not a tagged digest")]
    MissingTag(String),
    /// The tag names an algorithm this crate does not produce.
    #[error("unsupported digest algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    /// The hex part has the wrong length for its algorithm.
    #[error("{alg} digest must have {expected} hex characters, found {actual}")]
    DigestLength {
        /// Algorithm tag.
        alg: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}
