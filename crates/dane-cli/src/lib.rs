//! # dane-cli
//!
//! Command-line interface for DANE validation and TLSA adoption scans.
//!
//! ## Features
//!
//! - **Validate**: resolve a TLSA record, fetch the server chain, print the verdict
//! - **Scan**: rate-limited bulk TLSA lookups over a sampled domain list
//! - **Query**: print the TLSA records published for a service
//! - **Educational mode**: `--explain` flag explains what commands do
//! - **Multiple output formats**: Pretty, JSON, CSV, YAML

pub mod cli;
pub mod config;
pub mod domains;
pub mod education;
pub mod output;

pub use cli::run;
