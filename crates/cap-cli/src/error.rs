use thiserror::Error;

/// A check ran to completion and its verdict was negative.
#[derive(Debug, Error)]
pub enum CheckFailed {
    #[error("ethics signature {0}")]
    Signature(&'static str),
    #[error("governance chain is broken ({0} mismatching pointers)")]
    Chain(usize),
    #[error("ledger hash mismatch: expected {expected}, got {actual}")]
    Ledger { expected: String, actual: String },
    #[error("webhook signature is invalid")]
    Webhook,
    #[error("no {0} configured")]
    Missing(&'static str),
}
