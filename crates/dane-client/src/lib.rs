//! TLSA resolver client.
//!
//! This crate provides the [`DaneClient`] used for both single-domain TLSA
//! lookups and rate-limited batch scans over one shared resolver socket.

#![doc(html_root_url = "https://docs.rs/dane-client/0.1.0")]

mod client;
mod config;
mod inflight;
mod transport;
mod wire;
pub mod api;

#[cfg(test)]
mod testing;

pub use client::{DaneClient, DaneClientBuilder};
pub use config::*;
pub use dane_core::{DaneError, Result};
pub use tokio_util::sync::CancellationToken;
