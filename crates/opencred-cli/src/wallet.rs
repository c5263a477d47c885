//! # Wallet Subcommands
//!
//! Inspects the configured wallet provider and derives registry DIDs.
//! The CLI uses the in-process [`StaticWalletProvider`] seeded from the
//! environment — the same capability trait a browser-injected provider
//! would implement.
//!
//! ## Environment
//!
//! - `OPENCRED_WALLET_ACCOUNTS` — comma-separated wallet addresses.
//! - `OPENCRED_WALLET_CHAIN_ID` — numeric chain id (default 137).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use opencred_core::WalletAddress;
use opencred_wallet::{did_for_wallet, ChainId, StaticWalletProvider, WalletProvider};

/// Arguments for the `wallet` subcommand tree.
#[derive(Args, Debug)]
pub struct WalletArgs {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Show the provider's accounts, chain, and derived DIDs.
    Show,

    /// Derive the registry DID for an address.
    Did {
        /// Wallet address.
        address: String,
    },
}

/// Build the provider from the environment.
fn provider_from_env() -> Result<StaticWalletProvider> {
    let accounts = std::env::var("OPENCRED_WALLET_ACCOUNTS")
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|raw| WalletAddress::new(raw.trim()).map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()
        .context("OPENCRED_WALLET_ACCOUNTS contains an invalid address")?;
    let chain = std::env::var("OPENCRED_WALLET_CHAIN_ID")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(ChainId)
        .unwrap_or(ChainId(137));
    Ok(StaticWalletProvider::new(accounts, chain))
}

/// Run a wallet subcommand.
pub fn run_wallet(args: &WalletArgs) -> Result<u8> {
    match &args.command {
        WalletCommand::Show => {
            let provider = provider_from_env()?;
            let chain = provider.chain_id()?;
            println!("chain: {chain} (supported: {})", chain.is_supported());
            match provider.accounts() {
                Ok(accounts) => {
                    for address in accounts {
                        println!("{address}  {}", did_for_wallet(&address));
                    }
                }
                Err(e) => {
                    println!("no accounts: {e}");
                    return Ok(1);
                }
            }
        }
        WalletCommand::Did { address } => {
            let address = WalletAddress::new(address.as_str())?;
            println!("{}", did_for_wallet(&address));
        }
    }
    Ok(0)
}
