//! Single-domain TLSA lookups.

use crate::DaneClient;
use dane_core::{DaneError, Result, TlsaQuery, TlsaRecord, Transport};

/// Single-query resolver operations
pub struct TlsaApi<'a> {
    client: &'a DaneClient,
}

impl<'a> TlsaApi<'a> {
    pub(crate) const fn new(client: &'a DaneClient) -> Self {
        Self { client }
    }

    /// Look up the TLSA record for a service.
    ///
    /// When the answer holds several records the first one is returned.
    pub async fn resolve(
        &self,
        port: &str,
        transport: Transport,
        domain: &str,
    ) -> Result<TlsaRecord> {
        let query = TlsaQuery::new(port, transport, domain)?;
        self.resolve_query(&query).await
    }

    /// Look up the TLSA record for a prepared query
    pub async fn resolve_query(&self, query: &TlsaQuery) -> Result<TlsaRecord> {
        let mut records = self.resolve_all_query(query).await?;
        Ok(records.swap_remove(0))
    }

    /// Look up every TLSA record published for a service (e.g. during key rollover)
    pub async fn resolve_all(
        &self,
        port: &str,
        transport: Transport,
        domain: &str,
    ) -> Result<Vec<TlsaRecord>> {
        let query = TlsaQuery::new(port, transport, domain)?;
        self.resolve_all_query(&query).await
    }

    /// Look up every TLSA record for a prepared query
    pub async fn resolve_all_query(&self, query: &TlsaQuery) -> Result<Vec<TlsaRecord>> {
        let records = self.client.exchange(query).await?;
        if records.is_empty() {
            return Err(DaneError::NotFound {
                name: query.name().to_string(),
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeResolver};
    use dane_core::{CertificateUsage, MatchingType, Selector};
    use hickory_proto::op::ResponseCode;
    use std::time::Duration;

    fn client(resolver: &FakeResolver) -> DaneClient {
        DaneClient::builder(resolver.address())
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_returns_first_record() {
        let resolver = FakeResolver::spawn(|q| {
            let mut response = testing::answer_tlsa(q);
            let second = testing::answer_tlsa(q).answers()[0].clone();
            response.add_answer(second);
            vec![response]
        })
        .await;

        let record = client(&resolver)
            .tlsa()
            .resolve("443", Transport::Tcp, "app.ilabbank.com")
            .await
            .unwrap();

        assert_eq!(record.certificate_usage, CertificateUsage::DaneEe);
        assert_eq!(record.selector, Selector::Spki);
        assert_eq!(record.matching_type, MatchingType::Sha256);
        assert_eq!(record.association_data, testing::ASSOCIATION_DATA.to_vec());

        let received = resolver.received.lock().unwrap();
        assert_eq!(
            received[0].query.queries()[0].name().to_ascii(),
            "_443._tcp.app.ilabbank.com."
        );
    }

    #[tokio::test]
    async fn test_resolve_all_returns_every_record() {
        let resolver = FakeResolver::spawn(|q| {
            let mut response = testing::answer_tlsa(q);
            let second = testing::answer_tlsa(q).answers()[0].clone();
            response.add_answer(second);
            vec![response]
        })
        .await;

        let records = client(&resolver)
            .tlsa()
            .resolve_all("25", Transport::Tcp, "mail.example")
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_error_rcode() {
        let resolver =
            FakeResolver::spawn(|q| vec![testing::answer_rcode(q, ResponseCode::NXDomain)]).await;

        let err = client(&resolver)
            .tlsa()
            .resolve("443", Transport::Tcp, "missing.example")
            .await
            .unwrap_err();
        assert!(matches!(err, DaneError::Resolution { .. }));
        assert!(err.is_no_record());
    }

    #[tokio::test]
    async fn test_resolve_without_tlsa_answer() {
        let resolver = FakeResolver::spawn(|q| vec![testing::answer_empty(q)]).await;

        let err = client(&resolver)
            .tlsa()
            .resolve("443", Transport::Tcp, "plain.example")
            .await
            .unwrap_err();
        match err {
            DaneError::NotFound { name } => assert_eq!(name, "_443._tcp.plain.example."),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_times_out() {
        let resolver = FakeResolver::spawn(|_| Vec::new()).await;

        let client = DaneClient::builder(resolver.address())
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let err = client
            .tlsa()
            .resolve("443", Transport::Tcp, "slow.example")
            .await
            .unwrap_err();
        assert!(matches!(err, DaneError::Timeout(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_resolve_skips_foreign_ids() {
        let resolver = FakeResolver::spawn(|q| {
            let mut stray = testing::answer_empty(q);
            stray.set_id(q.id().wrapping_add(1));
            vec![stray, testing::answer_tlsa(q)]
        })
        .await;

        let record = client(&resolver)
            .tlsa()
            .resolve("443", Transport::Tcp, "app.ilabbank.com")
            .await
            .unwrap();
        assert_eq!(record.certificate_usage, CertificateUsage::DaneEe);
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_domain() {
        let client = DaneClient::new("127.0.0.1:53").unwrap();
        let err = client
            .tlsa()
            .resolve("443", Transport::Tcp, "")
            .await
            .unwrap_err();
        assert!(matches!(err, DaneError::InvalidQuery(_)));
    }
}
