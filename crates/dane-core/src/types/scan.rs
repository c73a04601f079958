use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use super::Transport;

/// Size of the DNS transaction id space
pub const TRANSACTION_ID_SPACE: usize = 1 << 16;

/// One query of a batch scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Domain being probed
    pub domain: String,
    /// DNS transaction id, unique among requests in flight
    pub transaction_id: u16,
    /// Service port label
    pub port: String,
    /// Service transport label
    pub transport: Transport,
}

/// Whether a TLSA answer was found for a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// A TLSA record was present in the answer section
    Yes,
    /// The resolver answered without a TLSA record
    No,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => f.write_str("YES"),
            Self::No => f.write_str("NO"),
        }
    }
}

/// A classified response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    /// Domain the response was attributed to
    pub domain: String,
    /// Transaction id the response carried
    pub transaction_id: u16,
    /// Outcome
    pub classification: Classification,
    /// Response code when it was not a success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rcode: Option<String>,
}

impl fmt::Display for ScanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.domain, self.classification)
    }
}

/// Why a batch scan stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Every dispatched query was answered
    Completed,
    /// Nothing arrived for the idle timeout after dispatch finished
    IdleTimeout,
    /// The overall deadline elapsed
    DeadlineElapsed,
    /// The caller cancelled the scan
    Cancelled,
    /// Reading from the shared connection failed
    ConnectionLost {
        /// Transport error text
        error: String,
    },
}

impl StopReason {
    /// Returns true if the scan ended because the connection failed
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("all queries answered"),
            Self::IdleTimeout => f.write_str("idle timeout"),
            Self::DeadlineElapsed => f.write_str("deadline elapsed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::ConnectionLost { error } => write!(f, "connection lost: {error}"),
        }
    }
}

/// Outcome of a batch scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// When the scan started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the scan
    #[serde(serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
    /// Domains handed to the scan
    pub requested: usize,
    /// Queries written to the resolver
    pub dispatched: usize,
    /// Domains with a TLSA answer
    pub found: usize,
    /// Classifications in arrival order
    pub entries: Vec<ScanEntry>,
    /// Dispatched domains that never got an answer
    pub unanswered: Vec<String>,
    /// Why the scan stopped
    pub stop: StopReason,
}

impl ScanReport {
    /// Number of classified responses
    #[must_use]
    pub fn classified(&self) -> usize {
        self.entries.len()
    }

    /// Classification recorded for a domain, if any
    #[must_use]
    pub fn classification(&self, domain: &str) -> Option<Classification> {
        self.entries
            .iter()
            .find(|e| e.domain == domain)
            .map(|e| e.classification)
    }
}

fn as_secs_f64<S: Serializer>(d: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}
