//! Certificate chain retrieval and DANE match decisions.
//!
//! This crate provides the two halves of single-domain validation:
//!
//! - **Fetch**: [`CertificateSource`] and its TLS implementation, which
//!   returns the chain a server presents without judging it
//! - **Verify**: [`validate`] decides whether a TLSA record authenticates
//!   that chain
//!
//! # Example
//!
//! ```rust
//! use dane_core::{CertificateChain, TlsaRecord};
//! use dane_tls::validate;
//!
//! let record: TlsaRecord = "3 0 0 0102".parse().unwrap();
//! assert!(validate(&CertificateChain::new(vec![vec![1, 2]]), &record));
//! assert!(!validate(&CertificateChain::default(), &record));
//! ```

#![doc(html_root_url = "https://docs.rs/dane-tls/0.1.0")]

mod error;
mod fetch;
mod verify;

pub use error::{TlsError, TlsResult};
pub use fetch::{CertificateSource, TlsCertificateSource, TlsCertificateSourceBuilder, TrustMode};
pub use verify::{
    association_data, generate, match_certificate, summarize, validate, validate_with_policy,
    CertificateSummary, MatchPolicy,
};
