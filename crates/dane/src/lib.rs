//! DANE (RFC 6698) TLSA lookups, batch adoption scans and certificate matching.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dane::{DaneClient, TlsCertificateSource, Transport};
//!
//! #[tokio::main]
//! async fn main() -> dane::Result<()> {
//!     let client = DaneClient::new("8.8.8.8:53")?;
//!     let source = TlsCertificateSource::new()?;
//!
//!     // Single-domain validation
//!     let outcome = dane::validate_domain(&client, &source, "443", Transport::Tcp, "example.com").await?;
//!     println!("{}", if outcome.verdict { "success!!!" } else { "bogus certificate!!!" });
//!
//!     // Batch adoption scan
//!     let report = client.scan(["example.com", "example.org"]).send().await?;
//!     println!("Found {} TLSA records", report.found);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Enables `tls`
//! - `tls` - Certificate retrieval and match decisions ([`dane_tls`])

#![doc(html_root_url = "https://docs.rs/dane/0.1.0")]

// Re-export core types
pub use dane_core::*;

// Re-export client
pub use dane_client::{
    api, CancellationToken, DaneClient, DaneClientBuilder, RateLimitConfig, ScanConfig,
};

// Re-export certificate handling if enabled
#[cfg(feature = "tls")]
pub use dane_tls::{
    association_data, generate, summarize, validate, validate_with_policy, CertificateSource,
    CertificateSummary, MatchPolicy, TlsCertificateSource, TlsError, TrustMode,
};

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;

/// Result of validating one service
#[cfg(feature = "tls")]
#[derive(Debug, Clone)]
pub struct Validation {
    /// The TLSA record the decision was made against
    pub record: TlsaRecord,
    /// The chain the server presented
    pub chain: CertificateChain,
    /// Whether the record authenticates the chain
    pub verdict: bool,
}

/// Resolve the TLSA record for a service, fetch the chain the server presents
/// and decide whether the record authenticates it.
///
/// Lookup and connection failures are errors; a chain that does not match
/// yields a [`Validation`] with `verdict == false`.
#[cfg(feature = "tls")]
pub async fn validate_domain(
    client: &DaneClient,
    source: &dyn CertificateSource,
    port: &str,
    transport: Transport,
    domain: &str,
) -> Result<Validation> {
    validate_domain_with_policy(client, source, port, transport, domain, MatchPolicy::WholeChain)
        .await
}

/// [`validate_domain`] with an explicit [`MatchPolicy`]
#[cfg(feature = "tls")]
pub async fn validate_domain_with_policy(
    client: &DaneClient,
    source: &dyn CertificateSource,
    port: &str,
    transport: Transport,
    domain: &str,
    policy: MatchPolicy,
) -> Result<Validation> {
    let record = client.tlsa().resolve(port, transport, domain).await?;
    tracing::debug!(%record, "TLSA record resolved");

    let tcp_port: u16 = port
        .parse()
        .map_err(|_| DaneError::InvalidQuery(format!("invalid port {port:?}")))?;
    let chain = source.fetch_chain(domain, tcp_port).await?;

    let verdict = validate_with_policy(&chain, &record, policy);
    tracing::info!(domain, certificates = chain.len(), verdict, "DANE validation finished");
    Ok(Validation {
        record,
        chain,
        verdict,
    })
}
