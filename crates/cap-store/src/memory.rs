//! In-memory record store.

use crate::error::StoreError;
use crate::traits::{backup_path, is_record_path, RecordStore, StoredRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct Slot {
    bytes: Vec<u8>,
    modified: Option<DateTime<Utc>>,
}

/// Keeps records in a sorted map keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    slots: BTreeMap<PathBuf, Slot>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` at `path` with the given modification time.
    pub fn insert(
        &mut self,
        path: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
        modified: Option<DateTime<Utc>>,
    ) {
        self.slots.insert(
            path.into(),
            Slot {
                bytes: bytes.into(),
                modified,
            },
        );
    }

    /// Bytes stored at `path`, including recovery copies.
    pub fn get(&self, path: &Path) -> Option<&[u8]> {
        self.slots.get(path).map(|slot| slot.bytes.as_slice())
    }

    /// Every stored path, including recovery copies.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.slots.keys().map(PathBuf::as_path)
    }
}

impl RecordStore for MemoryRecordStore {
    fn list(&self, root: &Path) -> Result<Vec<PathBuf>, StoreError> {
        Ok(self
            .slots
            .keys()
            .filter(|p| p.starts_with(root) && is_record_path(p))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<StoredRecord, StoreError> {
        let slot = self
            .slots
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        Ok(StoredRecord {
            path: path.to_path_buf(),
            bytes: slot.bytes.clone(),
            modified: slot.modified,
        })
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        self.insert(path, bytes, Some(Utc::now()));
        Ok(())
    }

    fn rewrite(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let slot = self
            .slots
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        slot.bytes = bytes.to_vec();
        Ok(())
    }

    fn backup(&mut self, path: &Path) -> Result<PathBuf, StoreError> {
        let slot = self
            .slots
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        let target = backup_path(path);
        self.slots.insert(target.clone(), slot);
        Ok(target)
    }
}
