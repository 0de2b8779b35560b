//! recovercheck-core
//!
//! Core library for finding goroutines that are launched without panic
//! recovery.
//!
//! This crate defines the syntax model, the recovery reachability analysis,
//! analyzer settings, and the Go frontend that feeds the analysis from files
//! on disk.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, editor integrations, etc.).

pub mod model;
pub mod analysis;
pub mod config;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
