//! Core types for DANE (RFC 6698) validation and TLSA scanning.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - **Types**: TLSA records, certificate chains, query names and scan results
//! - **Errors**: The shared error taxonomy in [`DaneError`]
//!
//! # Example
//!
//! ```rust
//! use dane_core::{TlsaQuery, Transport};
//!
//! let query = TlsaQuery::new("443", Transport::Tcp, "example.com").unwrap();
//! assert_eq!(query.name(), "_443._tcp.example.com.");
//! ```

#![doc(html_root_url = "https://docs.rs/dane-core/0.1.0")]

mod error;
pub mod types;

pub use error::{DaneError, Result};
pub use types::*;
