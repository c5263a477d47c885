//! # opencred-wallet — Wallet Provider Capability
//!
//! The registry only ever needs one thing from a wallet: an address
//! string (and the chain it lives on). Rather than reaching for an
//! ambient, globally-injected provider, everything that touches a wallet
//! depends on the [`WalletProvider`] trait — a capability that can be
//! handed in, swapped, and faked in tests.
//!
//! No transaction construction, signing, or chain consensus logic lives
//! here or anywhere else in the workspace.

pub mod did;
pub mod provider;

pub use did::did_for_wallet;
pub use provider::{ChainId, StaticWalletProvider, WalletError, WalletProvider};
