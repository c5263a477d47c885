//! # opencred-cli — CLI Client for the OpenCred Registry
//!
//! Subcommand modules, each exposing a clap `Args` struct and a `run_*`
//! entry point returning a process exit code:
//!
//! - [`credentials`] — issue / verify / share / revoke / history against
//!   a running registry API.
//! - [`hash`] — recompute a credential claim digest locally (the
//!   client-side preview of what issuance will store).
//! - [`wallet`] — inspect the configured wallet provider and derive
//!   registry DIDs from addresses.

pub mod client;
pub mod credentials;
pub mod hash;
pub mod wallet;
