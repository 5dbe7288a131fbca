//! # meshauth_core
//!
//! Core credential and token lifecycle for Meshauth: issuance, forward-auth
//! verification and refresh.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
