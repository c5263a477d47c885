//! # Wallet Provider Trait
//!
//! Abstraction over browser-injected (or otherwise external) wallet
//! providers. Consumers depend on this trait, never on a global. The
//! surface is the subset the registry actually uses: current accounts,
//! current chain, and change notifications.

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use opencred_core::WalletAddress;

/// Chain identifier (EIP-155 numeric id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Networks the registry front ends are expected to run against:
    /// Polygon mainnet, Polygon Amoy, Ethereum mainnet, Sepolia.
    pub const SUPPORTED: [ChainId; 4] = [ChainId(137), ChainId(80002), ChainId(1), ChainId(11155111)];

    /// Whether this chain is in the supported set.
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet provider failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// No provider is available in this environment.
    #[error("no wallet provider available")]
    NoProvider,

    /// The provider is available but holds no accounts.
    #[error("wallet has no accounts")]
    NoAccounts,
}

/// Callback invoked when the account list changes.
pub type AccountsCallback = Box<dyn Fn(&[WalletAddress]) + Send + Sync>;

/// Callback invoked when the active chain changes.
pub type ChainCallback = Box<dyn Fn(ChainId) + Send + Sync>;

/// Capability exposed by a connected wallet provider.
pub trait WalletProvider: Send + Sync {
    /// Current account list. The first entry is the active account.
    fn accounts(&self) -> Result<Vec<WalletAddress>, WalletError>;

    /// The chain the provider is currently connected to.
    fn chain_id(&self) -> Result<ChainId, WalletError>;

    /// Register a callback for account changes.
    fn on_accounts_changed(&self, callback: AccountsCallback);

    /// Register a callback for chain changes.
    fn on_chain_changed(&self, callback: ChainCallback);
}

/// In-process wallet provider with a fixed account list.
///
/// Used by the CLI (seeded from the environment) and by tests. Account
/// and chain mutations fire the registered callbacks, which makes the
/// subscription surface testable without a browser.
pub struct StaticWalletProvider {
    accounts: RwLock<Vec<WalletAddress>>,
    chain: RwLock<ChainId>,
    accounts_callbacks: Mutex<Vec<AccountsCallback>>,
    chain_callbacks: Mutex<Vec<ChainCallback>>,
}

impl StaticWalletProvider {
    /// Create a provider holding the given accounts on the given chain.
    pub fn new(accounts: Vec<WalletAddress>, chain: ChainId) -> Self {
        Self {
            accounts: RwLock::new(accounts),
            chain: RwLock::new(chain),
            accounts_callbacks: Mutex::new(Vec::new()),
            chain_callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Replace the account list and notify subscribers.
    pub fn set_accounts(&self, accounts: Vec<WalletAddress>) {
        *self.accounts.write() = accounts.clone();
        for cb in self.accounts_callbacks.lock().iter() {
            cb(&accounts);
        }
    }

    /// Switch the active chain and notify subscribers.
    pub fn set_chain(&self, chain: ChainId) {
        *self.chain.write() = chain;
        for cb in self.chain_callbacks.lock().iter() {
            cb(chain);
        }
    }
}

impl WalletProvider for StaticWalletProvider {
    fn accounts(&self) -> Result<Vec<WalletAddress>, WalletError> {
        let accounts = self.accounts.read();
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts.clone())
    }

    fn chain_id(&self) -> Result<ChainId, WalletError> {
        Ok(*self.chain.read())
    }

    fn on_accounts_changed(&self, callback: AccountsCallback) {
        self.accounts_callbacks.lock().push(callback);
    }

    fn on_chain_changed(&self, callback: ChainCallback) {
        self.chain_callbacks.lock().push(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn addr(fill: &str) -> WalletAddress {
        WalletAddress::new(format!("0x{}", fill.repeat(40 / fill.len()))).unwrap()
    }

    #[test]
    fn accounts_returns_active_account_first() {
        let provider = StaticWalletProvider::new(vec![addr("a"), addr("b")], ChainId(137));
        let accounts = provider.accounts().unwrap();
        assert_eq!(accounts[0], addr("a"));
    }

    #[test]
    fn empty_provider_reports_no_accounts() {
        let provider = StaticWalletProvider::new(vec![], ChainId(137));
        assert_eq!(provider.accounts(), Err(WalletError::NoAccounts));
    }

    #[test]
    fn account_change_fires_callbacks() {
        let provider = StaticWalletProvider::new(vec![addr("a")], ChainId(137));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        provider.on_accounts_changed(Box::new(move |accounts| {
            assert_eq!(accounts.len(), 1);
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        provider.set_accounts(vec![addr("b")]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_change_fires_callbacks() {
        let provider = StaticWalletProvider::new(vec![addr("a")], ChainId(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        provider.on_chain_changed(Box::new(move |chain| {
            assert_eq!(chain, ChainId(137));
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        provider.set_chain(ChainId(137));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.chain_id().unwrap(), ChainId(137));
    }

    #[test]
    fn supported_chain_set() {
        assert!(ChainId(137).is_supported());
        assert!(ChainId(80002).is_supported());
        assert!(!ChainId(56).is_supported());
    }
}
