use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::validation::ValidationError;

/// Hex case used when rendering a digest.
///
/// Chain pointers are uppercase, ethics signatures lowercase; both are part
/// of the stored artifact format and must not be mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexCase {
    /// `0-9a-f`
    Lower,
    /// `0-9A-F`
    Upper,
}

/// Supported digest algorithms for tagged digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlg {
    /// SHA-256.
    Sha256,
}

impl DigestAlg {
    /// Tag written before the `:` in a tagged digest.
    pub fn tag(self) -> &'static str {
        match self {
            DigestAlg::Sha256 => "SHA256",
        }
    }

    /// Hex length of a digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            DigestAlg::Sha256 => 64,
        }
    }

    fn from_tag(tag: &str) -> Result<Self, ValidationError> {
        match tag {
            "SHA256" => Ok(DigestAlg::Sha256),
            other => Err(ValidationError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Algorithm-tagged hex digest, rendered as `"<ALG>:<hex>"`.
///
/// The tag keeps stored pointers unambiguous if the digest algorithm ever
/// changes. Equality is exact, including hex case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaggedDigest {
    alg: DigestAlg,
    hex: String,
}

impl TaggedDigest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, hex: impl Into<String>) -> Result<Self, ValidationError> {
        let hex = hex.into();
        if hex.len() != alg.hex_len() {
            return Err(ValidationError::DigestLength {
                alg: alg.tag(),
                expected: alg.hex_len(),
                actual: hex.len(),
            });
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: hex,
            });
        }
        Ok(Self { alg, hex })
    }

    /// The all-zero sentinel marking either end of a chain.
    pub fn zero(alg: DigestAlg) -> Self {
        Self {
            alg,
            hex: "0".repeat(alg.hex_len()),
        }
    }

    /// SHA-256 of `bytes`, rendered in the requested case.
    pub fn sha256(bytes: &[u8], case: HexCase) -> Self {
        let hash = Sha256::digest(bytes);
        let hex = match case {
            HexCase::Lower => hex::encode(hash),
            HexCase::Upper => hex::encode_upper(hash),
        };
        Self {
            alg: DigestAlg::Sha256,
            hex,
        }
    }

    /// Parses `"<ALG>:<hex>"`.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let (tag, hex) = value
            .split_once(':')
            .ok_or_else(|| ValidationError::MissingTag(value.to_string()))?;
        Self::new(DigestAlg::from_tag(tag)?, hex)
    }

    /// Digest algorithm.
    pub fn alg(&self) -> DigestAlg {
        self.alg
    }

    /// Hex digest without the tag.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// True for the chain terminus sentinel.
    pub fn is_zero(&self) -> bool {
        self.hex.bytes().all(|b| b == b'0')
    }
}

impl fmt::Display for TaggedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.alg.tag(), self.hex)
    }
}

impl TryFrom<String> for TaggedDigest {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaggedDigest> for String {
    fn from(value: TaggedDigest) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinel_renders_64_zeros() {
        let zero = TaggedDigest::zero(DigestAlg::Sha256);
        assert_eq!(zero.to_string(), format!("SHA256:{}", "0".repeat(64)));
        assert!(zero.is_zero());
    }

    #[test]
    fn parse_rejects_unknown_tag_and_bad_length() {
        assert!(TaggedDigest::parse(&format!("MD5:{}", "a".repeat(32))).is_err());
        assert!(matches!(
            TaggedDigest::parse("SHA256:abc"),
            Err(ValidationError::DigestLength { expected: 64, actual: 3, .. })
        ));
        assert!(matches!(
            TaggedDigest::parse("no-tag"),
            Err(ValidationError::MissingTag(_))
        ));
        assert!(matches!(
            TaggedDigest::parse(&format!("SHA256:{}", "g".repeat(64))),
            Err(ValidationError::PatternMismatch { .. })
        ));
    }

    #[test]
    fn sha256_respects_case() {
        let lower = TaggedDigest::sha256(b"abc", HexCase::Lower);
        let upper = TaggedDigest::sha256(b"abc", HexCase::Upper);
        assert_eq!(
            lower.hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(upper.hex(), lower.hex().to_uppercase());
        assert_ne!(lower, upper);
    }
}
