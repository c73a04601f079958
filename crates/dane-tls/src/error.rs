use std::time::Duration;
use thiserror::Error;

/// Result type alias for certificate operations
pub type TlsResult<T> = std::result::Result<T, TlsError>;

/// Errors from certificate retrieval and inspection
#[derive(Error, Debug)]
pub enum TlsError {
    /// TCP connection to the server failed
    #[error("connection failed: {0}")]
    Connect(String),

    /// TLS handshake failed
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Connect and handshake did not finish in time
    #[error("TLS connection timed out after {0:?}")]
    Timeout(Duration),

    /// The domain cannot be used as a TLS server name
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// Certificate bytes could not be parsed
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Trust store or client setup failed
    #[error("TLS configuration error: {0}")]
    Config(String),

    /// Reading a PEM file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TlsError> for dane_core::DaneError {
    fn from(err: TlsError) -> Self {
        match err {
            TlsError::Connect(msg) | TlsError::Handshake(msg) => Self::Tls(msg),
            TlsError::InvalidServerName(name) => Self::Tls(format!("invalid server name: {name}")),
            TlsError::Timeout(d) => Self::Timeout(d),
            TlsError::Certificate(msg) => Self::Certificate(msg),
            TlsError::Config(msg) => Self::Config(msg),
            TlsError::Io(e) => Self::Io(e),
        }
    }
}
