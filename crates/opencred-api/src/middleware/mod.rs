//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`metrics`]: Prometheus-compatible request metrics.
//!
//! Request/response tracing uses `tower_http::trace::TraceLayer` and
//! authentication lives in [`crate::auth`]; both are wired in
//! [`crate::app`].

pub mod metrics;
