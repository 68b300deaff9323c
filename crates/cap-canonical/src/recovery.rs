//! Best-effort recovery of structured payloads from lossy transport text.
//!
//! Stages run in order of increasing aggressiveness and stop at the first
//! one that yields a non-empty JSON object:
//!
//! 1. [`RecoveryStage::Direct`]: parse the text as-is.
//! 2. [`RecoveryStage::Repaired`]: if the text looks like flattened JSON
//!    (braces and colons, no quoted keys), quote bare keys and values and
//!    parse again.
//! 3. [`RecoveryStage::Salvaged`]: parse the slice between the first `{` and
//!    the last `}`.
//!
//! When all three fail the caller gets [`RecoveryFailure`], whose
//! [`fallback`](RecoveryFailure::fallback) is the literal empty object.
//!
//! Stage 2 quotes every bare value, so `{a:1}` recovers as `{"a":"1"}`.
//! Numbers, `true` and `null` written bare come back as strings.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Recovery stage that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    /// Input was valid JSON.
    Direct,
    /// Input was flattened JSON repaired by quoting keys and values.
    Repaired,
    /// Input contained a JSON object surrounded by other text.
    Salvaged,
}

/// Successful recovery.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// Recovered object (never empty).
    pub value: Map<String, Value>,
    /// Stage that produced it.
    pub stage: RecoveryStage,
}

impl Recovered {
    /// Recovered object as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.value)
    }
}

/// No stage produced a non-empty object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload could not be recovered ({input_len} bytes)")]
pub struct RecoveryFailure {
    /// Length of the rejected input.
    pub input_len: usize,
}

impl RecoveryFailure {
    /// The explicit placeholder emitted in place of an unrecoverable payload.
    pub fn fallback(&self) -> Value {
        Value::Object(Map::new())
    }
}

fn quoted_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]*"\s*:"#).expect("invalid regex"))
}

fn bare_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$.\-]*)\s*:").expect("invalid regex")
    })
}

fn bare_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":\s*([A-Za-z0-9_.+\-][A-Za-z0-9_.+\-: ]*?)\s*([,}])").expect("invalid regex")
    })
}

/// Recovers a JSON object from untrusted text.
pub fn recover(raw: &str) -> Result<Recovered, RecoveryFailure> {
    if let Some(value) = parse_object(raw) {
        tracing::debug!(stage = "direct", "payload recovered");
        return Ok(Recovered {
            value,
            stage: RecoveryStage::Direct,
        });
    }

    if looks_flattened(raw) {
        let repaired = repair_flattened(raw);
        if let Some(value) = parse_object(&repaired) {
            tracing::debug!(stage = "repaired", "payload recovered");
            return Ok(Recovered {
                value,
                stage: RecoveryStage::Repaired,
            });
        }
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Some(value) = parse_object(&raw[start..=end]) {
                tracing::debug!(stage = "salvaged", "payload recovered");
                return Ok(Recovered {
                    value,
                    stage: RecoveryStage::Salvaged,
                });
            }
        }
    }

    tracing::warn!(len = raw.len(), "payload unrecoverable; emitting empty object");
    Err(RecoveryFailure {
        input_len: raw.len(),
    })
}

/// True when `raw` is brace-wrapped, has a `:` and no quoted key.
pub fn looks_flattened(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.starts_with('{')
        && trimmed.ends_with('}')
        && trimmed.contains(':')
        && !quoted_key_re().is_match(trimmed)
}

/// Applies the flattened-JSON repair transforms in order.
///
/// Strips wrapping quote characters, brace-wraps the text, quotes bare keys
/// that precede `:`, then quotes bare values that precede `,` or `}`.
pub fn repair_flattened(raw: &str) -> String {
    let mut text = raw.trim();
    while text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')))
    {
        text = text[1..text.len() - 1].trim();
    }

    let mut wrapped = String::with_capacity(text.len() + 2);
    if !text.starts_with('{') {
        wrapped.push('{');
    }
    wrapped.push_str(text);
    if !text.ends_with('}') {
        wrapped.push('}');
    }

    let keyed = bare_key_re().replace_all(&wrapped, r#"$1"$2":"#);
    bare_value_re()
        .replace_all(&keyed, r#":"$1"$2"#)
        .into_owned()
}

/// Extracts the CAP payload from a dispatch envelope.
///
/// Dispatchers wrap records as `{"client_payload": {"cap_payload": ...}}`
/// or `{"cap_payload": ...}`; a string payload is recovered recursively.
/// Values without an envelope are returned unchanged.
pub fn unwrap_envelope(value: Value) -> Result<Value, RecoveryFailure> {
    let inner = match &value {
        Value::Object(map) => map
            .get("client_payload")
            .and_then(|p| p.get("cap_payload"))
            .or_else(|| map.get("cap_payload"))
            .cloned(),
        _ => None,
    };
    match inner {
        None => Ok(value),
        Some(Value::String(text)) => recover(&text).map(Recovered::into_value),
        Some(payload @ Value::Object(_)) => Ok(payload),
        Some(_) => Err(RecoveryFailure { input_len: 0 }),
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}
