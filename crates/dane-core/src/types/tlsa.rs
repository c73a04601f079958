//! TLSA record data (RFC 6698 section 2.1).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{DaneError, Result};

/// Certificate usage field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum CertificateUsage {
    /// 0: CA constraint, PKIX validation still required
    PkixTa,
    /// 1: service certificate constraint, PKIX validation still required
    PkixEe,
    /// 2: trust anchor assertion
    DaneTa,
    /// 3: domain-issued certificate
    DaneEe,
    /// Private or unassigned value
    Other(u8),
}

impl CertificateUsage {
    /// Whether public CA validation is required in addition to the match
    #[must_use]
    pub const fn requires_pkix(self) -> bool {
        matches!(self, Self::PkixTa | Self::PkixEe)
    }

    /// Whether the record designates the end-entity certificate
    #[must_use]
    pub const fn targets_end_entity(self) -> bool {
        matches!(self, Self::PkixEe | Self::DaneEe)
    }
}

impl From<u8> for CertificateUsage {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::PkixTa,
            1 => Self::PkixEe,
            2 => Self::DaneTa,
            3 => Self::DaneEe,
            other => Self::Other(other),
        }
    }
}

impl From<CertificateUsage> for u8 {
    fn from(value: CertificateUsage) -> Self {
        match value {
            CertificateUsage::PkixTa => 0,
            CertificateUsage::PkixEe => 1,
            CertificateUsage::DaneTa => 2,
            CertificateUsage::DaneEe => 3,
            CertificateUsage::Other(other) => other,
        }
    }
}

/// Selector field: which part of the certificate is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum Selector {
    /// 0: full DER certificate
    Full,
    /// 1: DER SubjectPublicKeyInfo
    Spki,
    /// Private or unassigned value
    Other(u8),
}

impl From<u8> for Selector {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Full,
            1 => Self::Spki,
            other => Self::Other(other),
        }
    }
}

impl From<Selector> for u8 {
    fn from(value: Selector) -> Self {
        match value {
            Selector::Full => 0,
            Selector::Spki => 1,
            Selector::Other(other) => other,
        }
    }
}

/// Matching type field: how the selected bytes are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum MatchingType {
    /// 0: exact match on the selected content
    Exact,
    /// 1: SHA-256 digest
    Sha256,
    /// 2: SHA-512 digest
    Sha512,
    /// Private or unassigned value
    Other(u8),
}

impl MatchingType {
    /// Expected association data length, if fixed
    #[must_use]
    pub const fn digest_len(self) -> Option<usize> {
        match self {
            Self::Sha256 => Some(32),
            Self::Sha512 => Some(64),
            Self::Exact | Self::Other(_) => None,
        }
    }
}

impl From<u8> for MatchingType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Exact,
            1 => Self::Sha256,
            2 => Self::Sha512,
            other => Self::Other(other),
        }
    }
}

impl From<MatchingType> for u8 {
    fn from(value: MatchingType) -> Self {
        match value {
            MatchingType::Exact => 0,
            MatchingType::Sha256 => 1,
            MatchingType::Sha512 => 2,
            MatchingType::Other(other) => other,
        }
    }
}

/// A TLSA resource record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TlsaRecord {
    /// Certificate usage
    pub certificate_usage: CertificateUsage,
    /// Selector
    pub selector: Selector,
    /// Matching type
    pub matching_type: MatchingType,
    /// Certificate association data
    #[serde(serialize_with = "to_hex", deserialize_with = "from_hex")]
    pub association_data: Vec<u8>,
}

impl TlsaRecord {
    /// Create a record from its four fields
    #[must_use]
    pub fn new(
        certificate_usage: CertificateUsage,
        selector: Selector,
        matching_type: MatchingType,
        association_data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            certificate_usage,
            selector,
            matching_type,
            association_data: association_data.into(),
        }
    }

    /// Association data as lowercase hex
    #[must_use]
    pub fn association_hex(&self) -> String {
        hex::encode(&self.association_data)
    }

    /// Format as a zone file line for the given owner name
    #[must_use]
    pub fn to_zone_line(&self, owner: &str) -> String {
        format!("{owner} IN TLSA {self}")
    }
}

/// Presentation format: `<usage> <selector> <matching> <hex>`
impl fmt::Display for TlsaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            u8::from(self.certificate_usage),
            u8::from(self.selector),
            u8::from(self.matching_type),
            self.association_hex()
        )
    }
}

impl FromStr for TlsaRecord {
    type Err = DaneError;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.split_whitespace();
        let mut field = |name: &str| -> Result<u8> {
            fields
                .next()
                .ok_or_else(|| DaneError::InvalidQuery(format!("TLSA record is missing {name}")))?
                .parse::<u8>()
                .map_err(|e| DaneError::InvalidQuery(format!("invalid TLSA {name}: {e}")))
        };

        let usage = field("certificate usage")?;
        let selector = field("selector")?;
        let matching = field("matching type")?;

        // Presentation format allows the hex blob to be split by whitespace.
        let data: String = fields.collect();
        if data.is_empty() {
            return Err(DaneError::InvalidQuery(
                "TLSA record is missing association data".into(),
            ));
        }
        let association_data = hex::decode(&data)
            .map_err(|e| DaneError::InvalidQuery(format!("invalid TLSA association data: {e}")))?;

        Ok(Self::new(
            usage.into(),
            selector.into(),
            matching.into(),
            association_data,
        ))
    }
}

fn to_hex<S: Serializer>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(data))
}

fn from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    hex::decode(s).map_err(serde::de::Error::custom)
}
