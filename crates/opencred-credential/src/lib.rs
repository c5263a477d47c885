//! # opencred-credential — Credential Domain Logic
//!
//! The rules of the registry, independent of any transport or store:
//!
//! - **[`CredentialClaims`]** — the canonical claim object a credential
//!   hash commits to. The claim digest is the credential's integrity
//!   anchor; recomputing the digest from the same claims always
//!   reproduces the stored `credential_hash`.
//! - **[`generate_credential_id`]** — human-readable credential
//!   identifiers (`OC-<timestamp>-<random>`, base-36, uppercased).
//! - **Status derivation** ([`derive_verification_status`]) — the
//!   first-match rule order applied on every verification: revoked,
//!   then expired, then unverified issuer, then verified. `revoked` is
//!   terminal; `expired` is derived at read time from `valid_until`.
//! - **[`ShareGate`]** — access policy for share tokens: active flag,
//!   expiry, and view limits.

pub mod claims;
pub mod id;
pub mod share;
pub mod status;

pub use claims::CredentialClaims;
pub use id::generate_credential_id;
pub use share::{ShareDenied, ShareGate};
pub use status::{can_revoke, derive_verification_status, is_expired_at, DerivedStatus, StatusInputs};
