pub mod canonicalize;
pub mod ledger;
pub mod link;
pub mod list;
pub mod recover;
pub mod sign;
pub mod webhook;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Reads the named file, or stdin when no file is given.
pub fn read_input(input: Option<&Path>) -> Result<Vec<u8>, String> {
    match input {
        Some(path) => std::fs::read(path)
            .map_err(|e| format!("Failed to read file {}: {}", path.display(), e)),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

/// The explicit root, or the configured corpus root.
pub fn corpus_root(config: &cap_core::LedgerConfig, root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| config.corpus_root.clone())
}
