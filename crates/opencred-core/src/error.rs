//! # Validation Errors
//!
//! Structured errors produced when constructing validated domain types.
//! Each variant carries the offending value so callers can surface a
//! useful message without re-deriving context.

use thiserror::Error;

/// Validation failure for a domain-primitive type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The string is not a well-formed `did:method:identifier` DID.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// The string is not a `0x`-prefixed 20-byte hex wallet address.
    #[error("invalid wallet address: {0}")]
    InvalidWalletAddress(String),

    /// The credential identifier is empty or out of bounds.
    #[error("invalid credential identifier: {0}")]
    InvalidCredentialId(String),

    /// The share token is not 64 lowercase hex characters.
    #[error("invalid share token")]
    InvalidShareToken,

    /// The digest string is not 64 hex characters.
    #[error("invalid content digest: {0}")]
    InvalidDigest(String),

    /// Unknown credential type string.
    #[error("unknown credential type: {0}")]
    UnknownCredentialType(String),

    /// Unknown share access type string.
    #[error("unknown access type: {0}")]
    UnknownAccessType(String),

    /// Unknown user role string.
    #[error("unknown user role: {0}")]
    UnknownUserRole(String),

    /// Canonical serialization of a value failed.
    #[error("canonical serialization failed: {0}")]
    Canonicalization(String),
}
