//! Hash-chain linkage over an ordered corpus of records.
//!
//! Each record's hash is `SHA256(canonical(content_view(record)))` in
//! uppercase hex. Record `i` points back at `h[i-1]` and forward at
//! `h[i+1]`; both ends point at the zero sentinel. Because the chain fields
//! are excluded from the hashed view, linking an unchanged corpus twice
//! yields the same pointers.

use cap_canonical::{CanonicalizationError, Canonicalizer, DigestAlg, HexCase, TaggedDigest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::{content_view, GOVERNANCE_CHAIN, TIMESTAMP};

/// Errors raised before any chain pointer is computed.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No records to link.
    #[error("no CAP records found to link")]
    EmptyCorpus,
    /// A record has neither a parseable timestamp nor a modification time.
    #[error("record {id} carries no usable ordering signal")]
    UnorderableCorpus {
        /// Offending record.
        id: String,
    },
    /// A record is not a JSON object.
    #[error("record {id} is not a JSON object")]
    MalformedRecord {
        /// Offending record.
        id: String,
    },
    /// A record could not be canonicalized.
    #[error("record {id} could not be canonicalized: {source}")]
    Canonicalization {
        /// Offending record.
        id: String,
        /// Underlying failure.
        #[source]
        source: CanonicalizationError,
    },
}

/// One record of the corpus as handed to the linker.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    /// Stable identifier, typically the storage path.
    pub id: String,
    /// Parsed record.
    pub record: Value,
    /// Storage modification time, used when the record has no timestamp.
    pub modified: Option<DateTime<Utc>>,
}

impl ChainEntry {
    /// Creation time used for ordering: the record's own `timestamp` when
    /// it parses as RFC 3339, else the storage modification time.
    pub fn order_key(&self) -> Option<DateTime<Utc>> {
        self.record
            .get(TIMESTAMP)
            .and_then(Value::as_str)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or(self.modified)
    }
}

/// New chain pointers for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainUpdate {
    /// Index of the record in the slice given to [`link`].
    pub index: usize,
    /// Record identifier.
    pub id: String,
    /// This record's own content hash.
    pub record_hash: TaggedDigest,
    /// Pointer to the previous record.
    pub hash_prev: TaggedDigest,
    /// Pointer to the next record.
    pub hash_next: TaggedDigest,
}

impl ChainUpdate {
    /// Writes the pointers into `record`, keeping any other
    /// `governance_chain` fields. Returns whether anything changed.
    pub fn apply(&self, record: &mut Value) -> bool {
        let Some(map) = record.as_object_mut() else {
            return false;
        };
        let chain = map
            .entry(GOVERNANCE_CHAIN)
            .or_insert_with(|| Value::Object(Map::new()));
        if !chain.is_object() {
            *chain = Value::Object(Map::new());
        }
        let prev = Value::String(self.hash_prev.to_string());
        let next = Value::String(self.hash_next.to_string());
        let changed =
            chain.get("hash_prev") != Some(&prev) || chain.get("hash_next") != Some(&next);
        if let Some(chain) = chain.as_object_mut() {
            chain.insert("hash_prev".to_string(), prev);
            chain.insert("hash_next".to_string(), next);
        }
        changed
    }
}

/// Content hash used for chain pointers.
pub fn record_hash(
    record: &Value,
    canonicalizer: &Canonicalizer,
) -> Result<TaggedDigest, CanonicalizationError> {
    let canonical = canonicalizer.canonicalize(&content_view(record))?;
    Ok(TaggedDigest::sha256(&canonical.bytes, HexCase::Upper))
}

/// Returns entry indices in creation order, ties broken by id.
pub fn chain_order(entries: &[ChainEntry]) -> Result<Vec<usize>, ChainError> {
    if entries.is_empty() {
        return Err(ChainError::EmptyCorpus);
    }
    let mut keyed = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        if !entry.record.is_object() {
            return Err(ChainError::MalformedRecord {
                id: entry.id.clone(),
            });
        }
        let key = entry.order_key().ok_or_else(|| ChainError::UnorderableCorpus {
            id: entry.id.clone(),
        })?;
        keyed.push((key, idx));
    }
    keyed.sort_by(|(ka, ia), (kb, ib)| {
        ka.cmp(kb)
            .then_with(|| entries[*ia].id.cmp(&entries[*ib].id))
    });
    Ok(keyed.into_iter().map(|(_, idx)| idx).collect())
}

/// Computes chain pointers for every entry, in chain order.
pub fn link(
    entries: &[ChainEntry],
    canonicalizer: &Canonicalizer,
) -> Result<Vec<ChainUpdate>, ChainError> {
    let order = chain_order(entries)?;
    let hashes = ordered_hashes(entries, &order, canonicalizer)?;
    let zero = TaggedDigest::zero(DigestAlg::Sha256);

    let updates = order
        .iter()
        .enumerate()
        .map(|(pos, &idx)| ChainUpdate {
            index: idx,
            id: entries[idx].id.clone(),
            record_hash: hashes[pos].clone(),
            hash_prev: if pos == 0 {
                zero.clone()
            } else {
                hashes[pos - 1].clone()
            },
            hash_next: hashes.get(pos + 1).cloned().unwrap_or_else(|| zero.clone()),
        })
        .collect::<Vec<_>>();

    tracing::debug!(records = updates.len(), "computed chain pointers");
    Ok(updates)
}

fn ordered_hashes(
    entries: &[ChainEntry],
    order: &[usize],
    canonicalizer: &Canonicalizer,
) -> Result<Vec<TaggedDigest>, ChainError> {
    order
        .iter()
        .map(|&idx| {
            record_hash(&entries[idx].record, canonicalizer).map_err(|source| {
                ChainError::Canonicalization {
                    id: entries[idx].id.clone(),
                    source,
                }
            })
        })
        .collect()
}

/// Overall result of a chain verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    /// Every pointer matches.
    Valid,
    /// At least one pointer is wrong or missing.
    Broken,
    /// No records.
    Empty,
}

/// A pointer that does not match the recomputed hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainBreak {
    /// Position in chain order.
    pub position: usize,
    /// Record identifier.
    pub id: String,
    /// `hash_prev` or `hash_next`.
    pub field: &'static str,
    /// Pointer the record should carry.
    pub expected: String,
    /// Pointer the record carries, if any.
    pub actual: Option<String>,
}

/// Result of [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Overall status.
    pub status: ChainStatus,
    /// Number of records checked.
    pub records: usize,
    /// Every mismatching pointer, in chain order.
    pub breaks: Vec<ChainBreak>,
}

/// Recomputes every pointer and reports the ones that do not match.
pub fn verify_chain(
    entries: &[ChainEntry],
    canonicalizer: &Canonicalizer,
) -> Result<ChainReport, ChainError> {
    if entries.is_empty() {
        return Ok(ChainReport {
            status: ChainStatus::Empty,
            records: 0,
            breaks: Vec::new(),
        });
    }

    let mut breaks = Vec::new();
    for (position, update) in link(entries, canonicalizer)?.into_iter().enumerate() {
        let chain = entries[update.index].record.get(GOVERNANCE_CHAIN);
        for (field, expected) in [
            ("hash_prev", &update.hash_prev),
            ("hash_next", &update.hash_next),
        ] {
            let actual = chain
                .and_then(|c| c.get(field))
                .and_then(Value::as_str)
                .map(str::to_string);
            let expected = expected.to_string();
            if actual.as_deref() != Some(expected.as_str()) {
                breaks.push(ChainBreak {
                    position,
                    id: update.id.clone(),
                    field,
                    expected,
                    actual,
                });
            }
        }
    }

    let status = if breaks.is_empty() {
        ChainStatus::Valid
    } else {
        tracing::warn!(breaks = breaks.len(), "governance chain broken");
        ChainStatus::Broken
    };
    Ok(ChainReport {
        status,
        records: entries.len(),
        breaks,
    })
}
