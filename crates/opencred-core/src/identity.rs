//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the string identifiers that cross the
//! API boundary. Each is a distinct type with format validation at
//! construction time — you cannot pass a [`ShareToken`] where a
//! [`CredentialId`] is expected, and a value that deserialized is a
//! value that validated.
//!
//! Row identifiers (profiles, institutions, credentials, shares) are
//! plain `uuid::Uuid` values owned by the API layer's records.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// W3C Decentralized Identifier (DID).
///
/// Format: `did:<method>:<method-specific-id>` where the method is
/// lowercase alphanumeric and the method-specific id is non-empty.
/// Stored as plain text; no resolution protocol is implemented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not
    /// match the `did:method:identifier` format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let rest = s
            .strip_prefix("did:")
            .ok_or_else(|| ValidationError::InvalidDid(s.to_string()))?;
        let (method, id) = rest
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidDid(s.to_string()))?;
        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            || id.is_empty()
        {
            return Err(ValidationError::InvalidDid(s.to_string()));
        }
        Ok(())
    }

    /// Access the DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An EVM-style wallet address: `0x` followed by 40 hex characters.
///
/// Addresses are normalized to lowercase on construction, matching how
/// the registry stores and compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WalletAddress(String);

impl_validating_deserialize!(WalletAddress);

impl WalletAddress {
    /// Create a wallet address, validating format and normalizing case.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWalletAddress`] unless the input
    /// is `0x` + 40 hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| ValidationError::InvalidWalletAddress(s.clone()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidWalletAddress(s));
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Access the normalized (lowercase) address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable credential identifier, e.g. `OC-MDK3J2A1-4F7Q9Z2X`.
///
/// Validation is deliberately loose — the registry treats unknown
/// identifiers as "not found", not as malformed requests — but empty
/// and oversized values are rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CredentialId(String);

impl_validating_deserialize!(CredentialId);

impl CredentialId {
    /// Maximum accepted identifier length.
    pub const MAX_LEN: usize = 100;

    /// Create a credential identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCredentialId`] when the trimmed
    /// value is empty or longer than [`Self::MAX_LEN`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() || s.len() > Self::MAX_LEN {
            return Err(ValidationError::InvalidCredentialId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque share token: 64 lowercase hex characters (256 bits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShareToken(String);

impl_validating_deserialize!(ShareToken);

impl ShareToken {
    /// Create a share token, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidShareToken`] unless the input is
    /// exactly 64 lowercase hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.len() != 64
            || !s
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(ValidationError::InvalidShareToken);
        }
        Ok(Self(s))
    }

    /// Access the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShareToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_accepts_well_formed() {
        let did = Did::new("did:opencred:0xabc123").unwrap();
        assert_eq!(did.as_str(), "did:opencred:0xabc123");
    }

    #[test]
    fn did_rejects_malformed() {
        assert!(Did::new("opencred:0xabc").is_err());
        assert!(Did::new("did:").is_err());
        assert!(Did::new("did:UPPER:x").is_err());
        assert!(Did::new("did:opencred:").is_err());
    }

    #[test]
    fn did_deserialize_validates() {
        let ok: Result<Did, _> = serde_json::from_str("\"did:web:example.org\"");
        assert!(ok.is_ok());
        let bad: Result<Did, _> = serde_json::from_str("\"not-a-did\"");
        assert!(bad.is_err());
    }

    #[test]
    fn wallet_address_normalizes_to_lowercase() {
        let addr = WalletAddress::new(format!("0x{}", "AB".repeat(20))).unwrap();
        assert_eq!(addr.as_str(), &format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn wallet_address_rejects_bad_length_and_chars() {
        assert!(WalletAddress::new("0x1234").is_err());
        assert!(WalletAddress::new(format!("0x{}", "zz".repeat(20))).is_err());
        assert!(WalletAddress::new("ab".repeat(21)).is_err());
    }

    #[test]
    fn credential_id_bounds() {
        assert!(CredentialId::new("OC-ABC-DEF").is_ok());
        assert!(CredentialId::new("   ").is_err());
        assert!(CredentialId::new("x".repeat(101)).is_err());
    }

    #[test]
    fn share_token_requires_64_lowercase_hex() {
        assert!(ShareToken::new("a".repeat(64)).is_ok());
        assert!(ShareToken::new("A".repeat(64)).is_err());
        assert!(ShareToken::new("a".repeat(63)).is_err());
        assert!(ShareToken::new("g".repeat(64)).is_err());
    }
}
