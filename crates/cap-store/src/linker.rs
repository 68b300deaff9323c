//! Persisted chain runs over a stored corpus.

use crate::codec::{decode_record, encode_record};
use crate::error::StoreError;
use crate::traits::RecordStore;
use cap_canonical::Canonicalizer;
use cap_core::{link, verify_chain, ChainEntry, ChainReport, CoreError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of [`link_corpus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    /// Records in the chain.
    pub records: usize,
    /// Records whose chain pointers were rewritten, in chain order.
    pub rewritten: Vec<PathBuf>,
    /// Recovery copies made before rewriting.
    pub backups: Vec<PathBuf>,
}

impl LinkReport {
    /// Records left untouched because their pointers already matched.
    pub fn unchanged(&self) -> usize {
        self.records - self.rewritten.len()
    }
}

/// Reads every record under `root` as a chain entry, keyed by path.
pub fn load_entries<S: RecordStore + ?Sized>(
    store: &S,
    root: &Path,
) -> Result<Vec<ChainEntry>, StoreError> {
    store
        .list(root)?
        .iter()
        .map(|path| {
            let stored = store.read(path)?;
            Ok(ChainEntry {
                id: path.display().to_string(),
                record: decode_record(&stored)?,
                modified: stored.modified,
            })
        })
        .collect()
}

/// Links every record under `root` into one governance chain.
///
/// All pointers are computed before anything is written, so a corpus that
/// cannot be ordered or canonicalized is left untouched. Each record whose
/// pointers change is backed up and then rewritten in place, keeping its
/// modification time; records that already carry the right pointers are
/// skipped. Interrupting a run leaves every
/// record either in its old or its new form, and running again completes
/// the chain.
pub fn link_corpus<S: RecordStore + ?Sized>(
    store: &mut S,
    root: &Path,
    canonicalizer: &Canonicalizer,
) -> Result<LinkReport, StoreError> {
    let mut entries = load_entries(store, root)?;
    let updates = link(&entries, canonicalizer).map_err(CoreError::from)?;

    let mut report = LinkReport {
        records: updates.len(),
        rewritten: Vec::new(),
        backups: Vec::new(),
    };
    for update in &updates {
        let record = &mut entries[update.index].record;
        if !update.apply(record) {
            continue;
        }
        let bytes = encode_record(record)?;
        let path = PathBuf::from(&update.id);
        report.backups.push(store.backup(&path)?);
        store.rewrite(&path, &bytes)?;
        tracing::info!(
            record = %update.id,
            hash_prev = %update.hash_prev,
            hash_next = %update.hash_next,
            "linked record"
        );
        report.rewritten.push(path);
    }

    tracing::info!(
        records = report.records,
        rewritten = report.rewritten.len(),
        "governance chain linked"
    );
    Ok(report)
}

/// Verifies the stored chain under `root` without modifying it.
///
/// An empty corpus yields an `Empty` report rather than an error.
pub fn verify_corpus<S: RecordStore + ?Sized>(
    store: &S,
    root: &Path,
    canonicalizer: &Canonicalizer,
) -> Result<ChainReport, StoreError> {
    let entries = load_entries(store, root)?;
    Ok(verify_chain(&entries, canonicalizer).map_err(CoreError::from)?)
}
