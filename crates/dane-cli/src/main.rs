//! danescan - DANE validator and TLSA adoption scanner
//!
//! Validates a server's certificate chain against its TLSA record, or scans
//! a domain list to measure how many publish one.

use anyhow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dane_cli::run().await
}
