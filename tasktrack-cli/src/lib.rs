//! # Tasktrack CLI Library
//!
//! This library provides the command-line front end of Tasktrack: it wires
//! configuration, the local cache, the session and the synchronizer
//! together and renders the synchronized state as text.
//!
//! ## Modules
//!
//! - `app`: Construction of the session, cache, HTTP store and synchronizer
//! - `cli`: Command-line arguments
//! - `commands`: Command handlers, including the authentication boundary
//! - `config`: Configuration management
//! - `error`: Error handling and exit codes
//! - `render`: Plain-text output

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
