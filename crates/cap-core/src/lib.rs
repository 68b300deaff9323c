//! Record model, chain linkage, signing and verification for the CAP ledger.
//!
//! This crate provides:
//! - The typed record view and the hashed views derived from it
//! - Hash-chain linkage and chain verification over an ordered corpus
//! - Ethics signing and signature verification
//! - HMAC verification of inbound webhook deliveries
//! - Content-address integrity checks against the external ledger
//!
//! Core invariants:
//! - Hashed views exclude `governance_chain` and `ledger_hash`
//! - Everything here is pure; persistence lives in `cap-store`
//! - Verification failures are verdicts, not errors
//!
#![deny(missing_docs)]

/// Hash-chain linkage.
pub mod chain;
/// Process configuration.
pub mod config;
/// Error types for core operations.
pub mod errors;
/// Ethics signing and verification.
pub mod ethics;
/// Ledger content-address integrity checks.
pub mod ledger;
/// CAP record model.
pub mod record;
/// Webhook delivery verification.
pub mod webhook;

pub use chain::{
    chain_order, link, record_hash, verify_chain, ChainBreak, ChainEntry, ChainError,
    ChainReport, ChainStatus, ChainUpdate,
};
pub use config::{ConfigError, LedgerConfig, WebhookSecret};
pub use errors::CoreError;
pub use ethics::{
    compute_ethics_signature, sign_record, signing_view, verify_ethics_signature, SignError,
    SignatureVerdict,
};
pub use ledger::{
    check_artifact, check_integrity, content_address, verify_remote, ArtifactFetcher,
    FetchError, IntegrityVerdict,
};
pub use record::{content_view, CapRecord, GovernanceChain, ValidatorSignatures};
pub use webhook::{
    compute_signature, verify_signature, WebhookDelivery, WebhookGate, WebhookResponse,
};
