//! CAP CLI - Command-line interface for record recovery, signing, chain linking and verification.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod fetch;
mod output;

use commands::{canonicalize, ledger, link, list, recover, sign, webhook};
use config::ConfigArgs;

#[derive(Parser)]
#[command(name = "cap")]
#[command(about = "CAP ledger canonicalization, signing, chain linking and verification CLI")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show canonical bytes for input JSON
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<PathBuf>,
        /// Print the hygiene report to stderr
        #[arg(long)]
        report: bool,
    },
    /// Recover a CAP payload from malformed transport text
    Recover {
        /// Input text file (or stdin if not provided)
        input: Option<PathBuf>,
        /// Write the recovered payload here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Add an ethics signature to a record
    Sign {
        /// Record to sign
        input: PathBuf,
        /// Write the signed record here instead of overwriting the input
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check the ethics signature of a record
    VerifySignature {
        /// Record to check
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Link every record under the corpus root into one governance chain
    Link {
        /// Corpus root (defaults to the configured corpus root)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify the governance chain under the corpus root
    VerifyChain {
        /// Corpus root (defaults to the configured corpus root)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Exit with error code if the chain is broken
        #[arg(long)]
        strict: bool,
    },
    /// Check a stored artifact against its ledger hash
    CheckLedger {
        /// Artifact URL or local file (defaults to the configured ledger URL)
        source: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the webhook signature header value for a body
    WebhookSign {
        /// Raw request body
        body: PathBuf,
    },
    /// Verify a webhook signature against a body
    WebhookVerify {
        /// Raw request body
        body: PathBuf,
        /// Presented signature header value
        #[arg(long)]
        signature: String,
    },
    /// List records under the corpus root
    List {
        /// Corpus root (defaults to the configured corpus root)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    config::init_tracing(&cli.config.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.config.into_ledger_config()?;
    match cli.command {
        Commands::Canonicalize { input, report } => canonicalize::run(input, report),
        Commands::Recover { input, out } => recover::run(input, out),
        Commands::Sign { input, out } => sign::run(input, out),
        Commands::VerifySignature { input, json } => sign::verify(input, json),
        Commands::Link { root, json } => link::run(&config, root, json),
        Commands::VerifyChain { root, json, strict } => link::verify(&config, root, json, strict),
        Commands::CheckLedger { source, json } => ledger::run(&config, source, json),
        Commands::WebhookSign { body } => webhook::sign(&config, body),
        Commands::WebhookVerify { body, signature } => webhook::verify(&config, body, signature),
        Commands::List { root, json } => list::run(&config, root, json),
    }
}
