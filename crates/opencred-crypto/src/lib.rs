//! # opencred-crypto — Cryptographic Primitives for the OpenCred Registry
//!
//! This crate provides the cryptographic building blocks used throughout
//! the workspace:
//!
//! - **SHA-256 digest computation** from
//!   [`CanonicalBytes`](opencred_core::CanonicalBytes), producing
//!   [`ContentDigest`](opencred_core::ContentDigest) values. This is the
//!   path every credential hash takes.
//! - **Share-token generation** — 256-bit random tokens from the
//!   operating system RNG, rendered as 64 lowercase hex characters.
//!
//! There is deliberately no signing here: credential integrity in this
//! registry is a content digest, not a signature.

pub mod sha256;
pub mod token;

pub use sha256::sha256_digest;
pub use token::generate_share_token;
