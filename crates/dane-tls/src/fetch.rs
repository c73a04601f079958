//! Retrieval of the certificate chain a TLS server presents.

use crate::error::{TlsError, TlsResult};
use async_trait::async_trait;
use dane_core::{CertificateChain, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, Error as RustlsError, RootCertStore, SignatureScheme};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument, warn};

/// Default bound on connect plus handshake
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplies the certificate chain a server presents
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Connect to `domain:port` and return the presented chain, leaf first.
    async fn fetch_chain(&self, domain: &str, port: u16) -> Result<CertificateChain>;
}

/// How the TLS client treats the server's chain during the handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrustMode {
    /// Accept any chain and hostname; TLSA matching is the authority.
    /// Handshake signatures are still checked against the leaf key.
    #[default]
    Dane,
    /// Require a chain to the system trust store or the extra root
    Pkix,
}

/// [`CertificateSource`] backed by a rustls client
#[derive(Clone)]
pub struct TlsCertificateSource {
    connector: TlsConnector,
    trust: TrustMode,
    timeout: Duration,
}

impl std::fmt::Debug for TlsCertificateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsCertificateSource")
            .field("trust", &self.trust)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TlsCertificateSource {
    /// Create a source in [`TrustMode::Dane`] with default settings
    pub fn new() -> TlsResult<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> TlsCertificateSourceBuilder {
        TlsCertificateSourceBuilder::default()
    }

    /// Trust mode in effect
    #[must_use]
    pub const fn trust_mode(&self) -> TrustMode {
        self.trust
    }

    async fn handshake(&self, domain: &str, port: u16) -> TlsResult<CertificateChain> {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|_| TlsError::InvalidServerName(domain.to_string()))?;

        let stream = TcpStream::connect((domain, port))
            .await
            .map_err(|e| TlsError::Connect(format!("{domain}:{port}: {e}")))?;

        let tls = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| TlsError::Handshake(format!("{domain}:{port}: {e}")))?;

        let (_, connection) = tls.get_ref();
        let certs: Vec<Vec<u8>> = connection
            .peer_certificates()
            .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
            .unwrap_or_default();

        if certs.is_empty() {
            return Err(TlsError::Handshake(format!(
                "{domain}:{port}: server presented no certificates"
            )));
        }
        Ok(CertificateChain::new(certs))
    }
}

#[async_trait]
impl CertificateSource for TlsCertificateSource {
    #[instrument(skip(self), fields(trust = ?self.trust))]
    async fn fetch_chain(&self, domain: &str, port: u16) -> Result<CertificateChain> {
        let chain = tokio::time::timeout(self.timeout, self.handshake(domain, port))
            .await
            .map_err(|_| TlsError::Timeout(self.timeout))??;

        debug!(certificates = chain.len(), "certificate chain received");
        Ok(chain)
    }
}

/// Builder for [`TlsCertificateSource`]
#[derive(Debug, Clone)]
pub struct TlsCertificateSourceBuilder {
    trust: TrustMode,
    extra_root: Option<PathBuf>,
    timeout: Duration,
}

impl Default for TlsCertificateSourceBuilder {
    fn default() -> Self {
        Self {
            trust: TrustMode::default(),
            extra_root: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TlsCertificateSourceBuilder {
    /// Set the trust mode
    #[must_use]
    pub const fn trust_mode(mut self, trust: TrustMode) -> Self {
        self.trust = trust;
        self
    }

    /// Add an operator root (PEM file) to the PKIX trust store
    #[must_use]
    pub fn extra_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_root = Some(path.into());
        self
    }

    /// Bound connect plus handshake
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the source
    pub fn build(self) -> TlsResult<TlsCertificateSource> {
        if self.timeout.is_zero() {
            return Err(TlsError::Config("timeout must be greater than zero".into()));
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let algorithms = provider.signature_verification_algorithms;
        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsError::Config(e.to_string()))?;

        let config = match self.trust {
            TrustMode::Dane => {
                if let Some(path) = &self.extra_root {
                    debug!(path = %path.display(), "extra root unused in DANE trust mode");
                }
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(DaneVerifier { algorithms }))
                    .with_no_client_auth()
            }
            TrustMode::Pkix => {
                let roots = pkix_roots(native_roots(), self.extra_root.as_deref())?;
                builder.with_root_certificates(roots).with_no_client_auth()
            }
        };

        Ok(TlsCertificateSource {
            connector: TlsConnector::from(Arc::new(config)),
            trust: self.trust,
            timeout: self.timeout,
        })
    }
}

/// Certificates of the platform trust store. Unreadable entries are skipped.
fn native_roots() -> Vec<CertificateDer<'static>> {
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!(error = %error, "failed to read part of the system trust store");
    }
    native.certs
}

/// PKIX trust store: the system roots plus the operator's extra root.
///
/// Falls back to the bundled web PKI roots when the system store is empty,
/// as in minimal containers.
fn pkix_roots(
    native: Vec<CertificateDer<'static>>,
    extra_root: Option<&Path>,
) -> TlsResult<RootCertStore> {
    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(native);
    debug!(added, ignored, "loaded system trust store");

    if roots.is_empty() {
        warn!("system trust store is empty, using bundled web PKI roots");
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    if let Some(path) = extra_root {
        for cert in load_pem_certificates(path)? {
            roots
                .add(cert)
                .map_err(|e| TlsError::Config(format!("{}: {e}", path.display())))?;
        }
    }
    Ok(roots)
}

/// Read every `CERTIFICATE` block of a PEM file.
fn load_pem_certificates(path: &Path) -> TlsResult<Vec<CertificateDer<'static>>> {
    let bytes = std::fs::read(path)?;
    let certs: Vec<CertificateDer<'static>> = pem::parse_many(&bytes)
        .map_err(|e| TlsError::Certificate(format!("{}: {e}", path.display())))?
        .into_iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect();

    if certs.is_empty() {
        return Err(TlsError::Certificate(format!(
            "{}: no certificates found",
            path.display()
        )));
    }
    debug!(path = %path.display(), count = certs.len(), "loaded extra root");
    Ok(certs)
}

/// Accepts any chain and server name but still checks that the peer holds
/// the leaf's private key.
#[derive(Debug)]
struct DaneVerifier {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for DaneVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, RustlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, RustlsError> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, RustlsError> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
