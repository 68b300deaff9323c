//! On-disk record encoding.

use crate::error::StoreError;
use crate::traits::StoredRecord;
use serde_json::Value;

/// Encodes a record as two-space pretty JSON with a trailing newline.
pub fn encode_record(record: &Value) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(record)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses the stored bytes of a record.
pub fn decode_record(stored: &StoredRecord) -> Result<Value, StoreError> {
    serde_json::from_slice(&stored.bytes).map_err(|source| StoreError::InvalidJson {
        path: stored.path.clone(),
        source,
    })
}
