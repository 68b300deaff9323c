//! Storage backend trait.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Suffix appended to a record path for its recovery copy.
pub const BACKUP_SUFFIX: &str = ".bak";

/// A record as held by the store: raw bytes plus modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Location of the record.
    pub path: PathBuf,
    /// Raw stored bytes.
    pub bytes: Vec<u8>,
    /// Last modification time, when the backend tracks one.
    pub modified: Option<DateTime<Utc>>,
}

/// Durable storage for CAP records.
///
/// Implementations hold one JSON document per path. Callers serialize runs
/// against the same corpus; backends do no locking.
pub trait RecordStore {
    /// Every record path under `root`, sorted. Recovery copies are excluded.
    fn list(&self, root: &Path) -> Result<Vec<PathBuf>, StoreError>;

    /// Reads one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing is stored at `path`.
    fn read(&self, path: &Path) -> Result<StoredRecord, StoreError>;

    /// Replaces the bytes at `path`, creating it if needed.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError>;

    /// Replaces the bytes of an existing record, keeping its modification
    /// time. Chain order can fall back to that time, so linking must not
    /// move it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing is stored at `path`.
    fn rewrite(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError>;

    /// Copies the current bytes at `path` to its recovery copy and returns
    /// the copy's location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when nothing is stored at `path`.
    fn backup(&mut self, path: &Path) -> Result<PathBuf, StoreError>;
}

/// Location of the recovery copy for `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// True for paths the store treats as records.
pub(crate) fn is_record_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
