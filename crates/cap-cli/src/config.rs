//! Command-line and environment configuration.

use cap_core::{ConfigError, LedgerConfig, WebhookSecret};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Settings shared by every command, each with an environment fallback.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Root directory of the record corpus
    #[arg(long, global = true, env = "CAP_CORPUS_ROOT", default_value = "CAP_LOGS")]
    pub corpus_root: PathBuf,
    /// Shared webhook secret (`base64:` prefix for binary secrets)
    #[arg(long, global = true, env = "FALCONFORGE_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,
    /// Remote ledger artifact URL
    #[arg(long, global = true, env = "CAP_LEDGER_URL")]
    pub ledger_url: Option<String>,
    /// Timeout for the single artifact fetch, in seconds
    #[arg(long, global = true, env = "CAP_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, env = "CAP_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl ConfigArgs {
    /// Builds the ledger configuration. A configured but invalid secret is
    /// an error; an absent one is only an error for commands that need it.
    pub fn into_ledger_config(self) -> Result<LedgerConfig, ConfigError> {
        let webhook_secret = self
            .webhook_secret
            .as_deref()
            .map(WebhookSecret::parse)
            .transpose()?;
        Ok(LedgerConfig {
            corpus_root: self.corpus_root,
            webhook_secret,
            ledger_url: self.ledger_url,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            ..LedgerConfig::default()
        })
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
