/// Certificates presented by a TLS peer, leaf first, as DER bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<Vec<u8>>,
}

impl CertificateChain {
    /// Create a chain from DER-encoded certificates, leaf first
    #[must_use]
    pub const fn new(certs: Vec<Vec<u8>>) -> Self {
        Self { certs }
    }

    /// The end-entity certificate
    #[must_use]
    pub fn leaf(&self) -> Option<&[u8]> {
        self.certs.first().map(Vec::as_slice)
    }

    /// Certificates above the leaf (intermediates and any anchor sent)
    pub fn issuers(&self) -> impl Iterator<Item = &[u8]> {
        self.certs.iter().skip(1).map(Vec::as_slice)
    }

    /// All certificates in presentation order
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.certs.iter().map(Vec::as_slice)
    }

    /// Number of certificates
    #[must_use]
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Returns true if the peer presented nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl From<Vec<Vec<u8>>> for CertificateChain {
    fn from(certs: Vec<Vec<u8>>) -> Self {
        Self::new(certs)
    }
}
