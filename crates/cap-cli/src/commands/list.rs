//! List command implementation.

use super::corpus_root;
use crate::output;
use cap_core::{CapRecord, LedgerConfig};
use cap_store::{decode_record, FsRecordStore, RecordStore};
use std::path::PathBuf;

pub fn run(
    config: &LedgerConfig,
    root: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = corpus_root(config, root);
    let store = FsRecordStore::new();
    let paths = store
        .list(&root)
        .map_err(|e| format!("Failed to list {}: {}", root.display(), e))?;

    if !json {
        output::print_table_header();
    }

    for path in paths {
        let stored = store.read(&path)?;
        let value = match decode_record(&stored) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                continue;
            }
        };

        if json {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "path": path,
                    "record": value,
                }))?
            );
        } else {
            let record = CapRecord::from_value(&value)
                .map_err(|e| format!("Unexpected record shape in {}: {}", path.display(), e))?;
            println!("{}", output::format_table_row(&path, &record, stored.modified));
        }
    }

    Ok(())
}
