//! # DID Derivation
//!
//! A profile's DID is derived from its wallet address:
//! `did:opencred:<lowercase address>`. The DID is stored as plain text;
//! no resolution protocol is implemented.

use opencred_core::{Did, WalletAddress};

/// Derive the registry DID for a wallet address.
pub fn did_for_wallet(address: &WalletAddress) -> Did {
    Did::new(format!("did:opencred:{}", address.as_str()))
        .expect("wallet addresses always form valid DIDs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_uses_lowercase_address() {
        let addr = WalletAddress::new(format!("0x{}", "AB".repeat(20))).unwrap();
        let did = did_for_wallet(&addr);
        assert_eq!(did.as_str(), format!("did:opencred:0x{}", "ab".repeat(20)));
    }

    #[test]
    fn derivation_is_stable() {
        let addr = WalletAddress::new(format!("0x{}", "12".repeat(20))).unwrap();
        assert_eq!(did_for_wallet(&addr), did_for_wallet(&addr));
    }
}
