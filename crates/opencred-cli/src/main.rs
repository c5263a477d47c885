//! # opencred CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! HTTP subcommands talk to a running registry API; `hash` and `wallet`
//! run locally.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use opencred_cli::client::ApiClient;
use opencred_cli::credentials::{run_credentials, CredentialArgs};
use opencred_cli::hash::{run_hash, HashArgs};
use opencred_cli::wallet::{run_wallet, WalletArgs};

/// OpenCred registry CLI.
///
/// Issue, verify, share, and revoke academic credentials against a
/// running registry API, recompute claim hashes locally, and inspect
/// the configured wallet provider.
#[derive(Parser, Debug)]
#[command(name = "opencred", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Registry API base URL.
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    api_url: String,

    /// Bearer token (`<user-id>:<secret>`, or `<user-id>` in dev mode).
    /// Falls back to the OPENCRED_TOKEN env var.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Credential operations against the registry API.
    Credential(CredentialArgs),

    /// Recompute a credential claim digest locally.
    Hash(HashArgs),

    /// Wallet provider utilities.
    Wallet(WalletArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let token = cli.token.or_else(|| std::env::var("OPENCRED_TOKEN").ok());
    let client = ApiClient::new(&cli.api_url, token);

    let result = match &cli.command {
        Commands::Credential(args) => run_credentials(args, &client).await,
        Commands::Hash(args) => run_hash(args),
        Commands::Wallet(args) => run_wallet(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
