//! # etymon_core
//!
//! Core authentication and authorization logic for Etymon.

pub mod auth;
pub mod cache;
pub mod content;
pub mod db;
pub mod migrate;
pub mod models;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
