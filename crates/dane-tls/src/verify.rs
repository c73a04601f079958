//! TLSA match decisions (RFC 6698 section 2.1).

use crate::error::{TlsError, TlsResult};
use dane_core::{CertificateChain, CertificateUsage, MatchingType, Selector, TlsaRecord};
use ring::digest;
use std::borrow::Cow;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// Which certificates of the chain a record has to match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Every certificate in the chain must match the record
    #[default]
    WholeChain,
    /// Usages 1 and 3 match the leaf, usages 0 and 2 any certificate above it
    UsageAware,
}

/// Decide whether `record` authenticates `chain` under [`MatchPolicy::WholeChain`].
///
/// Fails closed: an empty chain, a certificate that cannot be parsed when the
/// selector needs it, an unassigned selector or matching type, or a single
/// non-matching certificate all yield `false`.
///
/// An empty chain is rejected on purpose even though "every certificate
/// matches" holds vacuously for it; a TLS peer always presents a leaf.
#[must_use]
pub fn validate(chain: &CertificateChain, record: &TlsaRecord) -> bool {
    validate_with_policy(chain, record, MatchPolicy::WholeChain)
}

/// Decide whether `record` authenticates `chain` under the given policy.
#[must_use]
pub fn validate_with_policy(
    chain: &CertificateChain,
    record: &TlsaRecord,
    policy: MatchPolicy,
) -> bool {
    if chain.is_empty() {
        return false;
    }

    match policy {
        MatchPolicy::WholeChain => chain.iter().all(|cert| match_certificate(cert, record)),
        MatchPolicy::UsageAware => match record.certificate_usage {
            CertificateUsage::PkixEe | CertificateUsage::DaneEe => chain
                .leaf()
                .is_some_and(|leaf| match_certificate(leaf, record)),
            CertificateUsage::PkixTa | CertificateUsage::DaneTa => chain
                .issuers()
                .any(|cert| match_certificate(cert, record)),
            CertificateUsage::Other(_) => false,
        },
    }
}

/// Returns true if one DER certificate matches the record's association data.
#[must_use]
pub fn match_certificate(cert_der: &[u8], record: &TlsaRecord) -> bool {
    association_data(cert_der, record.selector, record.matching_type)
        .is_ok_and(|data| data == record.association_data)
}

/// Compute the association data a record with this selector and matching
/// type would carry for `cert_der`.
pub fn association_data(
    cert_der: &[u8],
    selector: Selector,
    matching: MatchingType,
) -> TlsResult<Vec<u8>> {
    let selected: Cow<'_, [u8]> = match selector {
        Selector::Full => Cow::Borrowed(cert_der),
        Selector::Spki => Cow::Owned(parse(cert_der)?.public_key().raw.to_vec()),
        Selector::Other(value) => {
            return Err(TlsError::Certificate(format!("unsupported selector {value}")))
        }
    };

    match matching {
        MatchingType::Exact => Ok(selected.into_owned()),
        MatchingType::Sha256 => Ok(digest::digest(&digest::SHA256, &selected).as_ref().to_vec()),
        MatchingType::Sha512 => Ok(digest::digest(&digest::SHA512, &selected).as_ref().to_vec()),
        MatchingType::Other(value) => Err(TlsError::Certificate(format!(
            "unsupported matching type {value}"
        ))),
    }
}

/// Build the TLSA record that publishes `cert_der`.
pub fn generate(
    cert_der: &[u8],
    usage: CertificateUsage,
    selector: Selector,
    matching: MatchingType,
) -> TlsResult<TlsaRecord> {
    let data = association_data(cert_der, selector, matching)?;
    Ok(TlsaRecord::new(usage, selector, matching, data))
}

/// Human-readable facts about a certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: String,
    pub not_after: String,
}

/// Describe a DER certificate for display.
pub fn summarize(cert_der: &[u8]) -> TlsResult<CertificateSummary> {
    let cert = parse(cert_der)?;
    let validity = cert.validity();
    Ok(CertificateSummary {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.raw_serial_as_string(),
        not_before: validity.not_before.to_string(),
        not_after: validity.not_after.to_string(),
    })
}

fn parse(cert_der: &[u8]) -> TlsResult<X509Certificate<'_>> {
    X509Certificate::from_der(cert_der)
        .map(|(_, cert)| cert)
        .map_err(|e| TlsError::Certificate(e.to_string()))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn record(usage: u8, selector: u8, matching: u8, data_hex: &str) -> TlsaRecord {
        TlsaRecord::new(
            usage.into(),
            selector.into(),
            matching.into(),
            hex::decode(data_hex).unwrap(),
        )
    }

    fn single(cert: Vec<u8>) -> CertificateChain {
        CertificateChain::new(vec![cert])
    }

    #[test]
    fn test_association_data_all_combinations() {
        let cert = leaf();
        assert_eq!(cert.len(), 400);

        let cases = [
            (Selector::Full, MatchingType::Sha256, LEAF_SHA256),
            (Selector::Full, MatchingType::Sha512, LEAF_SHA512),
            (Selector::Spki, MatchingType::Exact, LEAF_SPKI),
            (Selector::Spki, MatchingType::Sha256, LEAF_SPKI_SHA256),
            (Selector::Spki, MatchingType::Sha512, LEAF_SPKI_SHA512),
        ];
        for (selector, matching, expected) in cases {
            let data = association_data(&cert, selector, matching).unwrap();
            assert_eq!(hex::encode(data), expected, "{selector:?} {matching:?}");
        }
        assert_eq!(
            association_data(&cert, Selector::Full, MatchingType::Exact).unwrap(),
            cert
        );
    }

    #[test]
    fn test_validate_matching_records() {
        let chain = single(leaf());
        assert!(validate(&chain, &record(3, 0, 1, LEAF_SHA256)));
        assert!(validate(&chain, &record(3, 1, 1, LEAF_SPKI_SHA256)));
        assert!(validate(&chain, &record(2, 1, 2, LEAF_SPKI_SHA512)));
        assert!(validate(&chain, &record(1, 0, 0, &hex::encode(leaf()))));
    }

    #[test]
    fn test_validate_fails_closed() {
        let chain = single(leaf());
        assert!(!validate(&chain, &record(3, 0, 1, OTHER_SHA256)));
        // Truncated digest never matches
        assert!(!validate(&chain, &record(3, 0, 1, &LEAF_SHA256[..32])));
        // Unassigned selector and matching type
        assert!(!validate(&chain, &record(3, 7, 1, LEAF_SHA256)));
        assert!(!validate(&chain, &record(3, 0, 9, LEAF_SHA256)));
        // Empty chain
        assert!(!validate(&CertificateChain::default(), &record(3, 0, 1, LEAF_SHA256)));
    }

    #[test]
    fn test_exact_match_requires_equal_length() {
        let chain = single(leaf());
        let full = leaf();

        let mut longer = full.clone();
        longer.push(0x00);
        let shorter = &full[..full.len() - 1];

        let exact = |data: &[u8]| {
            TlsaRecord::new(3u8.into(), 0u8.into(), 0u8.into(), data.to_vec())
        };
        assert!(validate(&chain, &exact(&full)));
        assert!(!validate(&chain, &exact(shorter)));
        assert!(!validate(&chain, &exact(&longer)));
        assert!(!validate(&chain, &exact(&[])));
    }

    #[test]
    fn test_any_changed_byte_breaks_the_match() {
        let chain = single(leaf());
        let matching = record(3, 0, 1, LEAF_SHA256);
        assert!(validate(&chain, &matching));

        for i in 0..matching.association_data.len() {
            let mut altered = matching.clone();
            altered.association_data[i] ^= 0x01;
            assert!(!validate(&chain, &altered), "byte {i} changed but still matched");
        }
    }

    #[test]
    fn test_validate_unparseable_certificate_under_spki() {
        let chain = single(vec![0x30, 0x03, 0x01, 0x02]);
        assert!(!validate(&chain, &record(3, 1, 1, LEAF_SPKI_SHA256)));
        assert!(matches!(
            association_data(&[0x30, 0x03], Selector::Spki, MatchingType::Sha256),
            Err(TlsError::Certificate(_))
        ));
    }

    #[test]
    fn test_whole_chain_requires_every_certificate() {
        let chain = CertificateChain::new(vec![leaf(), other()]);
        assert!(!validate(&chain, &record(3, 0, 1, LEAF_SHA256)));
        assert!(!validate(&chain, &record(2, 0, 1, OTHER_SHA256)));

        let same = CertificateChain::new(vec![leaf(), leaf()]);
        assert!(validate(&same, &record(3, 0, 1, LEAF_SHA256)));
    }

    #[test]
    fn test_usage_aware_policy() {
        let chain = CertificateChain::new(vec![leaf(), other()]);
        let policy = MatchPolicy::UsageAware;

        assert!(validate_with_policy(&chain, &record(3, 0, 1, LEAF_SHA256), policy));
        assert!(validate_with_policy(&chain, &record(1, 0, 1, LEAF_SHA256), policy));
        assert!(!validate_with_policy(&chain, &record(3, 0, 1, OTHER_SHA256), policy));

        assert!(validate_with_policy(&chain, &record(2, 0, 1, OTHER_SHA256), policy));
        assert!(validate_with_policy(&chain, &record(0, 0, 1, OTHER_SHA256), policy));
        assert!(!validate_with_policy(&chain, &record(2, 0, 1, LEAF_SHA256), policy));

        assert!(!validate_with_policy(&chain, &record(4, 0, 1, LEAF_SHA256), policy));
        assert!(!validate_with_policy(
            &CertificateChain::default(),
            &record(3, 0, 1, LEAF_SHA256),
            policy
        ));
    }

    #[test]
    fn test_generate_round_trips_through_validate() {
        let cert = leaf();
        let generated = generate(
            &cert,
            CertificateUsage::DaneEe,
            Selector::Spki,
            MatchingType::Sha256,
        )
        .unwrap();

        assert_eq!(generated.to_string(), format!("3 1 1 {LEAF_SPKI_SHA256}"));
        assert!(validate(&single(cert), &generated));
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&leaf()).unwrap();
        assert_eq!(summary.subject, "CN=app.ilabbank.com");
        assert_eq!(summary.issuer, "CN=app.ilabbank.com");
        assert!(!summary.serial.is_empty());

        assert!(summarize(&[0x00]).is_err());
    }
}
