//! Process configuration, read once at startup and passed by reference.

use base64::Engine;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::webhook::DEFAULT_ROUTE;

/// Prefix marking a base64-encoded secret.
const BASE64_PREFIX: &str = "base64:";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The webhook secret is required but was not provided.
    #[error("webhook secret is not configured")]
    MissingSecret,
    /// The webhook secret is present but empty or undecodable.
    #[error("invalid webhook secret: {0}")]
    InvalidSecret(String),
}

/// Shared HMAC secret, held as opaque bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Wraps raw secret bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parses a configured secret. `base64:<data>` is decoded, anything
    /// else is used as its UTF-8 bytes.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let bytes = match raw.strip_prefix(BASE64_PREFIX) {
            Some(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ConfigError::InvalidSecret(e.to_string()))?,
            None => raw.as_bytes().to_vec(),
        };
        if bytes.is_empty() {
            return Err(ConfigError::InvalidSecret("secret is empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WebhookSecret(<{} bytes>)", self.0.len())
    }
}

/// Ledger configuration shared by every component.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Root directory of the record corpus.
    pub corpus_root: PathBuf,
    /// Shared webhook secret, when this process verifies deliveries.
    pub webhook_secret: Option<WebhookSecret>,
    /// Route accepting CAP deliveries.
    pub webhook_route: String,
    /// Location of the remote ledger artifact, when configured.
    pub ledger_url: Option<String>,
    /// Timeout applied by the caller to the single artifact fetch.
    pub fetch_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from("CAP_LOGS"),
            webhook_secret: None,
            webhook_route: DEFAULT_ROUTE.to_string(),
            ledger_url: None,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl LedgerConfig {
    /// The webhook secret, or [`ConfigError::MissingSecret`].
    ///
    /// Hosts that verify deliveries call this at startup and treat the
    /// error as fatal.
    pub fn require_secret(&self) -> Result<&WebhookSecret, ConfigError> {
        self.webhook_secret.as_ref().ok_or(ConfigError::MissingSecret)
    }
}
