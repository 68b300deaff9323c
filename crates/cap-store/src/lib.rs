//! Durable storage and persisted runs for CAP records.
//!
//! This crate provides:
//! - The `RecordStore` trait for one-document-per-path record storage
//! - A filesystem backend and an in-memory backend
//! - Persisted chain linking and verification over a stored corpus
//! - Persisted signing and payload recovery
//!
//! Every in-place rewrite is preceded by a `<path>.bak` recovery copy.

#![deny(missing_docs)]

/// On-disk record encoding.
pub mod codec;
/// Error types for store operations.
pub mod error;
/// Filesystem-backed store.
pub mod fs;
/// Persisted chain runs.
pub mod linker;
/// In-memory store.
pub mod memory;
/// Persisted payload recovery.
pub mod recovery;
/// Persisted signing.
pub mod signer;
/// Storage backend trait.
pub mod traits;

pub use codec::{decode_record, encode_record};
pub use error::StoreError;
pub use fs::FsRecordStore;
pub use linker::{link_corpus, load_entries, verify_corpus, LinkReport};
pub use memory::MemoryRecordStore;
pub use recovery::{recover_to_store, RecoveryOutcome};
pub use signer::{sign_stored, verify_stored};
pub use traits::{backup_path, RecordStore, StoredRecord, BACKUP_SUFFIX};
