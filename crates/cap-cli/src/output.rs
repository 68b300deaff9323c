//! Output formatting utilities.

use cap_core::CapRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats a record as a simple table row.
pub fn format_table_row(
    path: &Path,
    record: &CapRecord,
    modified: Option<DateTime<Utc>>,
) -> String {
    let cap_id = record.cap_id.as_deref().unwrap_or("?");
    let created = record
        .timestamp
        .clone()
        .or_else(|| modified.map(|m| m.to_rfc3339_opts(SecondsFormat::Secs, true)))
        .unwrap_or_else(|| "?".to_string());
    let signed = record
        .validator_signatures
        .as_ref()
        .is_some_and(|s| s.ethics_signature.is_some());
    let linked = record.governance_chain.is_some();

    format!(
        "{:<38} {:<26} {:<6} {:<6} {}",
        truncate(cap_id, 38),
        truncate(&created, 26),
        yes_no(signed),
        yes_no(linked),
        path.display()
    )
}

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!(
        "{:<38} {:<26} {:<6} {:<6} {}",
        "CAP_ID", "CREATED", "SIGNED", "LINKED", "PATH"
    );
    println!("{}", "-".repeat(100));
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
