use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DaneError, Result};

/// Resource record type code of TLSA (RFC 6698 section 7.1)
pub const TLSA_RECORD_TYPE: u16 = 52;

/// Layer 4 protocol label used in the TLSA owner name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `_tcp`
    #[default]
    Tcp,
    /// `_udp`
    Udp,
}

impl Transport {
    /// Label as it appears in the query name, without the underscore
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = DaneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('_').to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(DaneError::InvalidQuery(format!(
                "unknown transport '{other}', expected tcp or udp"
            ))),
        }
    }
}

/// A TLSA lookup: the owner name `_<port>._<transport>.<domain>.`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlsaQuery {
    name: String,
    domain: String,
}

impl TlsaQuery {
    /// Build the query for a service.
    ///
    /// The domain may carry a trailing dot; the port must be a decimal
    /// port number.
    pub fn new(port: &str, transport: Transport, domain: &str) -> Result<Self> {
        let domain = domain.trim().trim_end_matches('.');
        if domain.is_empty() {
            return Err(DaneError::InvalidQuery("empty domain".into()));
        }
        if domain.split('.').any(str::is_empty) {
            return Err(DaneError::InvalidQuery(format!(
                "domain '{domain}' contains an empty label"
            )));
        }

        let port = port.trim();
        if port.parse::<u16>().is_err() {
            return Err(DaneError::InvalidQuery(format!("invalid port '{port}'")));
        }

        Ok(Self {
            name: format!("_{port}._{transport}.{domain}."),
            domain: domain.to_string(),
        })
    }

    /// Fully-qualified query name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Domain the query was built for, without trailing dot
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Record type selector for the lookup
    #[must_use]
    pub const fn record_type(&self) -> u16 {
        TLSA_RECORD_TYPE
    }
}

impl fmt::Display for TlsaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_name() {
        let query = TlsaQuery::new("443", Transport::Tcp, "example.com").unwrap();
        assert_eq!(query.name(), "_443._tcp.example.com.");
        assert_eq!(query.domain(), "example.com");
        assert_eq!(query.record_type(), 52);
    }

    #[test]
    fn test_query_name_udp_and_trailing_dot() {
        let query = TlsaQuery::new("853", Transport::Udp, "dns.example.").unwrap();
        assert_eq!(query.to_string(), "_853._udp.dns.example.");
    }

    #[test]
    fn test_query_rejects_malformed_input() {
        assert!(matches!(
            TlsaQuery::new("443", Transport::Tcp, ""),
            Err(DaneError::InvalidQuery(_))
        ));
        assert!(TlsaQuery::new("443", Transport::Tcp, "  .").is_err());
        assert!(TlsaQuery::new("443", Transport::Tcp, "a..example").is_err());
        assert!(TlsaQuery::new("https", Transport::Tcp, "example.com").is_err());
        assert!(TlsaQuery::new("", Transport::Tcp, "example.com").is_err());
    }

    #[test]
    fn test_transport_parse() {
        assert_eq!("tcp".parse::<Transport>().unwrap(), Transport::Tcp);
        assert_eq!("_UDP".parse::<Transport>().unwrap(), Transport::Udp);
        assert!("sctp".parse::<Transport>().is_err());
    }
}
