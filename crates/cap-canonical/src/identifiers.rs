use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; callers are responsible for conformity.
            pub fn new(value: String) -> Self {
                Self(value)
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if !Regex::new($pattern).expect("invalid regex").is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    ProfileId,
    "Identifier for canonicalization profiles (pattern: `[A-Za-z0-9_-]{8,128}`)",
    r"^[A-Za-z0-9_-]{8,128}$"
);
newtype!(
    CapId,
    "Record identifier. Producers may use any printable token; generated ids are UUIDv7.",
    r"^[!-~]{1,128}$"
);
newtype!(
    Timestamp,
    "RFC3339 timestamp (`Z` or numeric offset).",
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?(Z|[+-]\d{2}:\d{2})$"
);

impl CapId {
    /// Generates a time-ordered identifier.
    ///
    /// UUIDv7 carries the unix millisecond timestamp in its high 48 bits and
    /// random bits below, so ids sort approximately by creation time without
    /// coordination. Uniqueness across processes is probabilistic.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}
