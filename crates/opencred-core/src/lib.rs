//! # opencred-core — Foundational Types for the OpenCred Registry
//!
//! This crate sits at the bottom of the workspace dependency DAG and
//! provides the building blocks shared by every other crate:
//!
//! - **Canonical serialization** ([`CanonicalBytes`]) and **content
//!   digests** ([`ContentDigest`], [`sha256_digest`]). Digests are only
//!   computed from canonical bytes — raw byte slices are not accepted,
//!   so every credential hash in the system comes from one code path.
//! - **Identifier newtypes** ([`CredentialId`], [`WalletAddress`],
//!   [`Did`], [`ShareToken`]) that validate their contents at
//!   construction and at deserialization time.
//! - **Domain enums** ([`CredentialType`], [`CredentialStatus`],
//!   [`AccessType`], [`UserRole`], [`VerificationStatus`]) with stable
//!   string forms matching the persisted database values.
//! - **[`ValidationError`]** — the structured error hierarchy for all of
//!   the above.
//!
//! ## Crate Policy
//!
//! No I/O, no async, no framework types. Everything here is plain data
//! with validation.

pub mod digest;
pub mod error;
pub mod identity;
pub mod types;

pub use digest::{sha256_digest, CanonicalBytes, ContentDigest};
pub use error::ValidationError;
pub use identity::{CredentialId, Did, ShareToken, WalletAddress};
pub use types::{AccessType, CredentialStatus, CredentialType, UserRole, VerificationStatus};
