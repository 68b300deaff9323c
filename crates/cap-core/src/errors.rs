use thiserror::Error;

/// Core error types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Chain linking or verification failed.
    #[error("chain error: {0}")]
    Chain(#[from] crate::chain::ChainError),
    /// Signing or signature verification failed.
    #[error("signing error: {0}")]
    Sign(#[from] crate::ethics::SignError),
    /// Configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    /// Artifact fetch failed.
    #[error("{0}")]
    Fetch(#[from] crate::ledger::FetchError),
    /// Canonicalization error.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] cap_canonical::CanonicalizationError),
}
