use std::time::Duration;
use thiserror::Error;

/// Result type alias for DANE operations
pub type Result<T> = std::result::Result<T, DaneError>;

/// Errors that can occur while resolving, fetching or scanning
#[derive(Error, Debug)]
pub enum DaneError {
    /// Sending to or receiving from the resolver failed
    #[error("transport error: {0}")]
    Transport(String),

    /// No response arrived in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The resolver answered with a non-success response code
    #[error("resolution failed: response code {rcode}")]
    Resolution {
        /// Response code reported by the resolver
        rcode: String,
    },

    /// The answer section carried no TLSA record
    #[error("no TLSA record found for {name}")]
    NotFound {
        /// Query name that was looked up
        name: String,
    },

    /// The query could not be built from the given input
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The batch does not fit into the transaction id space
    #[error("batch of {len} domains exceeds the transaction id space of {max}")]
    BatchTooLarge {
        /// Number of domains requested
        len: usize,
        /// Largest batch that can be correlated unambiguously
        max: usize,
    },

    /// A DNS message could not be encoded or decoded
    #[error("protocol error: {0}")]
    Protocol(String),

    /// TLS connection or handshake failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// Certificate data could not be read or parsed
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaneError {
    /// Returns true if the error is a failure of the resolver transport
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::Io(_))
    }

    /// Returns true if the error means "no usable record" rather than a failure
    #[must_use]
    pub const fn is_no_record(&self) -> bool {
        matches!(self, Self::Resolution { .. } | Self::NotFound { .. })
    }
}
