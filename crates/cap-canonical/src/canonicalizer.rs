use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::hygiene::{HygieneReport, HygieneStatus};
use crate::identifiers::ProfileId;
use std::collections::BTreeMap;
use std::fmt;

/// Number of fractional digits kept when rounding numbers.
pub const DECIMAL_PLACES: usize = 6;

/// Magnitude at which ECMAScript switches to exponent notation.
const EXPONENT_THRESHOLD: f64 = 1e21;

/// Largest integer magnitude an IEEE 754 double holds exactly.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Input is not one of object, array, string, number, boolean or null.
    #[error("invalid value kind at {0}")]
    InvalidValueKind(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
}

/// Result of canonicalization.
#[derive(Debug)]
pub struct CanonicalizationResult {
    /// Canonical UTF-8 bytes for the input value.
    pub bytes: Vec<u8>,
    /// Hygiene report describing what normalization changed.
    pub report: HygieneReport,
}

/// Helper for building JSON paths during normalization.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic bytes.
///
/// Normalization rules, applied at every depth:
/// - object keys are emitted in ascending code-point order
/// - arrays keep their order
/// - strings have whitespace runs collapsed to one space and are trimmed
/// - numbers are rounded to six fractional digits, half away from zero
/// - booleans and null pass through
///
/// The byte form uses `,` and `:` separators with no padding and formats
/// numbers the way ECMAScript `Number#toString` does, so a JavaScript
/// producer hashing `JSON.stringify` of the same normalized value gets the
/// same digest.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    profile: ProfileId,
    round_numbers: bool,
}

impl Canonicalizer {
    /// Creates a new canonicalizer for the provided profile.
    pub fn new(profile: ProfileId) -> Self {
        Self {
            profile,
            round_numbers: true,
        }
    }

    /// Canonicalizer for the default `cap-canonical-v1` profile.
    pub fn v1() -> Self {
        Self::new(ProfileId::new(crate::PROFILE_V1.to_string()))
    }

    /// Disables number rounding; numbers are emitted at full precision.
    pub fn without_rounding(mut self) -> Self {
        self.round_numbers = false;
        self
    }

    /// Profile this canonicalizer reports.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Produces canonical bytes + hygiene report.
    pub fn canonicalize(
        &self,
        value: &Value,
    ) -> Result<CanonicalizationResult, CanonicalizationError> {
        let mut report = self.empty_report();
        let normalized = self.normalize_at(value, Path::root(), &mut report)?;

        let mut bytes = Vec::new();
        write_value(&normalized, &mut bytes);

        tracing::trace!(len = bytes.len(), status = ?report.status, "canonicalized value");
        Ok(CanonicalizationResult { bytes, report })
    }

    /// Canonicalizes any serializable type.
    ///
    /// Types that do not serialize to a JSON value (maps with non-string
    /// keys, non-finite floats) fail with [`CanonicalizationError::InvalidValueKind`].
    pub fn canonicalize_serializable<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<CanonicalizationResult, CanonicalizationError> {
        let value = serde_json::to_value(value)
            .map_err(|err| CanonicalizationError::InvalidValueKind(format!("root: {}", err)))?;
        self.canonicalize(&value)
    }

    /// Returns the normalized value tree without serializing it.
    pub fn normalize(&self, value: &Value) -> Result<Value, CanonicalizationError> {
        let mut report = self.empty_report();
        self.normalize_at(value, Path::root(), &mut report)
    }

    fn empty_report(&self) -> HygieneReport {
        HygieneReport {
            status: HygieneStatus::Ok,
            warnings: vec![],
            metrics: BTreeMap::new(),
            profile_id: self.profile.clone(),
        }
    }

    fn normalize_at(
        &self,
        value: &Value,
        path: Path,
        report: &mut HygieneReport,
    ) -> Result<Value, CanonicalizationError> {
        match value {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, child) in map {
                    out.insert(
                        key.clone(),
                        self.normalize_at(child, path.push_field(key), report)?,
                    );
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.normalize_at(item, path.push_index(idx), report))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::String(s) => {
                let collapsed = collapse_whitespace(s);
                if collapsed != *s {
                    report.record(
                        HygieneStatus::Ambiguous,
                        "WhitespaceCollapsed",
                        "strings_normalized",
                    );
                }
                Ok(Value::String(collapsed))
            }
            Value::Number(num) => {
                if let Some(magnitude) = integer_magnitude(num) {
                    if magnitude <= MAX_EXACT_INTEGER {
                        return Ok(Value::Number(num.clone()));
                    }
                    // Producers holding numbers as doubles see the nearest double.
                    report.record(HygieneStatus::Lossy, "IntegerRounded", "numbers_rounded");
                    return num
                        .as_f64()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| CanonicalizationError::InvalidValueKind(path.to_string()));
                }
                let f = num
                    .as_f64()
                    .ok_or_else(|| CanonicalizationError::InvalidValueKind(path.to_string()))?;
                if !f.is_finite() {
                    report.status = HygieneStatus::Invalid;
                    return Err(CanonicalizationError::NonFiniteNumber(path.to_string()));
                }
                if !self.round_numbers {
                    return Ok(Value::Number(num.clone()));
                }
                let rounded = round_half_away(f, DECIMAL_PLACES);
                if rounded.to_bits() != f.to_bits() {
                    report.record(HygieneStatus::Lossy, "NumberRounded", "numbers_rounded");
                }
                Number::from_f64(rounded)
                    .map(Value::Number)
                    .ok_or_else(|| CanonicalizationError::NonFiniteNumber(path.to_string()))
            }
            Value::Bool(_) | Value::Null => Ok(value.clone()),
        }
    }
}

/// Collapses runs of ECMAScript whitespace into a single space and trims.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        if is_js_whitespace(c) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

// `\s` in ECMAScript: Unicode White_Space minus U+0085, plus U+FEFF.
fn is_js_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// Rounds `value` to `places` fractional digits, ties away from zero.
///
/// Decides on the exact decimal expansion of the double rather than on
/// `value * 10^places`, which would misround values such as `0.0078125`.
pub fn round_half_away(value: f64, places: usize) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    // 40 digits is enough to separate any double near a 6-digit tie from
    // the tie itself.
    let exact = format!("{:.40}", value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let kept = &frac_part[..places.min(frac_part.len())];
    let rest = &frac_part[places.min(frac_part.len())..];
    let round_up = rest.as_bytes().first().is_some_and(|d| *d >= b'5');

    let mut digits: Vec<u8> = int_part.bytes().chain(kept.bytes()).collect();
    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    let split = digits.len() - kept.len();
    let text = format!(
        "{}{}.{}",
        if value < 0.0 { "-" } else { "" },
        String::from_utf8_lossy(&digits[..split]),
        String::from_utf8_lossy(&digits[split..])
    );
    text.parse::<f64>().unwrap_or(value)
}

/// Formats a finite double the way ECMAScript `Number#toString` does.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() >= EXPONENT_THRESHOLD {
        let s = format!("{:e}", value);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }
    format!("{}", value)
}

fn integer_magnitude(num: &Number) -> Option<u64> {
    num.as_u64().or_else(|| num.as_i64().map(i64::unsigned_abs))
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => {
            let text = if integer_magnitude(n).is_some_and(|m| m <= MAX_EXACT_INTEGER) {
                n.to_string()
            } else {
                format_number(n.as_f64().unwrap_or(0.0))
            };
            out.extend_from_slice(text.as_bytes());
        }
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_value(&map[key.as_str()], out);
            }
            out.push(b'}');
        }
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    // serde_json escapes exactly what JSON.stringify escapes for valid UTF-8.
    match serde_json::to_string(s) {
        Ok(escaped) => out.extend_from_slice(escaped.as_bytes()),
        Err(_) => out.extend_from_slice(b"\"\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_half_away(0.0078125, 6), 0.007813);
        assert_eq!(round_half_away(-0.0078125, 6), -0.007813);
        assert_eq!(round_half_away(1.23456749, 6), 1.234567);
        assert_eq!(round_half_away(0.99999951, 6), 1.0);
        assert_eq!(round_half_away(0.84, 6), 0.84);
    }

    #[test]
    fn formats_like_ecmascript() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.84), "0.84");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(123456.5), "123456.5");
    }

    #[test]
    fn collapses_unicode_whitespace() {
        assert_eq!(collapse_whitespace("  a\t\n b\u{a0}c  "), "a b c");
        assert_eq!(collapse_whitespace("\u{feff}x"), "x");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
