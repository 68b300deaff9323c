use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level field holding the record identifier.
pub const CAP_ID: &str = "cap_id";
/// Top-level field holding the creation timestamp.
pub const TIMESTAMP: &str = "timestamp";
/// Top-level chain pointer object.
pub const GOVERNANCE_CHAIN: &str = "governance_chain";
/// Top-level validator signature object.
pub const VALIDATOR_SIGNATURES: &str = "validator_signatures";
/// Field inside `validator_signatures` carrying the ethics digest.
pub const ETHICS_SIGNATURE: &str = "ethics_signature";
/// Externally assigned content address.
pub const LEDGER_HASH: &str = "ledger_hash";

/// Chain pointers stored on every linked record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceChain {
    /// Tagged digest of the previous record, or the zero sentinel.
    pub hash_prev: String,
    /// Tagged digest of the next record, or the zero sentinel.
    pub hash_next: String,
}

/// Validator attestations. Entries other than the ethics signature are kept verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidatorSignatures {
    /// `"SHA256:<lowercase hex>"` over the record's signing view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethics_signature: Option<String>,
    /// Other validator fields (`validator`, `empathy_signature`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view of a CAP record.
///
/// Hashing never goes through this type; it works on the raw JSON value so
/// fields this struct does not know about still participate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapRecord {
    /// Record identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_id: Option<String>,
    /// Creation time, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Application payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Chain pointers, absent until linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance_chain: Option<GovernanceChain>,
    /// Validator attestations, absent until signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_signatures: Option<ValidatorSignatures>,
    /// External content address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_hash: Option<String>,
    /// Scoring metrics and any other producer fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CapRecord {
    /// Parses a typed view from a record value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Numeric top-level fields, i.e. the scoring metrics.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, f64)> {
        self.extra
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|n| (k.as_str(), n)))
    }
}

/// The record as it participates in content hashing: everything except
/// the chain pointers and the external ledger hash.
pub fn content_view(record: &Value) -> Value {
    let mut view = record.clone();
    if let Value::Object(map) = &mut view {
        map.remove(GOVERNANCE_CHAIN);
        map.remove(LEDGER_HASH);
    }
    view
}
