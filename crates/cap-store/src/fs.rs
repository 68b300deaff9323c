//! Filesystem-backed record store.

use crate::error::StoreError;
use crate::traits::{backup_path, is_record_path, RecordStore, StoredRecord};
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Stores each record as a `.json` file in a directory tree.
///
/// `list` walks the tree recursively and returns files ending in `.json`,
/// which leaves `*.json.bak` recovery copies out.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRecordStore;

impl FsRecordStore {
    /// Creates a filesystem store.
    pub fn new() -> Self {
        Self
    }
}

fn not_found(path: &Path, err: io::Error) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(path.to_path_buf())
    } else {
        StoreError::Io(err)
    }
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StoreError> {
    for entry in fs::read_dir(dir).map_err(|e| not_found(dir, e))? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, out)?;
        } else if file_type.is_file() && is_record_path(&path) {
            out.push(path);
        }
    }
    Ok(())
}

impl RecordStore for FsRecordStore {
    fn list(&self, root: &Path) -> Result<Vec<PathBuf>, StoreError> {
        let mut paths = Vec::new();
        walk(root, &mut paths)?;
        paths.sort();
        tracing::debug!(root = %root.display(), records = paths.len(), "listed corpus");
        Ok(paths)
    }

    fn read(&self, path: &Path) -> Result<StoredRecord, StoreError> {
        let bytes = fs::read(path).map_err(|e| not_found(path, e))?;
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(StoredRecord {
            path: path.to_path_buf(),
            bytes,
            modified,
        })
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    fn rewrite(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let modified = fs::metadata(path)
            .map_err(|e| not_found(path, e))?
            .modified()?;
        fs::write(path, bytes)?;
        fs::File::options()
            .write(true)
            .open(path)?
            .set_modified(modified)?;
        Ok(())
    }

    fn backup(&mut self, path: &Path) -> Result<PathBuf, StoreError> {
        let target = backup_path(path);
        fs::copy(path, &target).map_err(|e| not_found(path, e))?;
        tracing::debug!(backup = %target.display(), "backed up record");
        Ok(target)
    }
}
