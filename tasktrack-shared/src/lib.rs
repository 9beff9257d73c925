//! # Tasktrack Shared Library
//!
//! This crate contains the domain types and cross-cutting primitives used by
//! the synchronization engine and the command-line client.
//!
//! ## Module Organization
//!
//! - `models`: Tasks, categories, tracking history and session credentials
//! - `error`: The remote store error taxonomy
//! - `auth`: Session context with an explicit lifecycle

pub mod auth;
pub mod error;
pub mod models;

/// Current version of the Tasktrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
