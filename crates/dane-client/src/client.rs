//! Main resolver client implementation.

use crate::api::{ScanBuilder, TlsaApi};
use crate::config::{RateLimitConfig, ScanConfig};
use crate::{transport, wire};
use dane_core::{DaneError, Result, TlsaQuery, TlsaRecord};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default timeout for single-query lookups
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Client bound to one resolver.
///
/// Cheap to clone; every operation opens its own socket so concurrent
/// lookups never share state.
#[derive(Clone, Debug)]
pub struct DaneClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    resolver: String,
    timeout: Duration,
    rate_limit: RateLimitConfig,
    quota: Quota,
    scan: ScanConfig,
}

impl DaneClient {
    /// Create a client for the resolver at `host:port` with default settings
    pub fn new(resolver: impl Into<String>) -> Result<Self> {
        DaneClientBuilder::new(resolver).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(resolver: impl Into<String>) -> DaneClientBuilder {
        DaneClientBuilder::new(resolver)
    }

    /// Single-domain TLSA lookups
    #[must_use]
    pub fn tlsa(&self) -> TlsaApi<'_> {
        TlsaApi::new(self)
    }

    /// Batch scan of many domains over one shared socket
    #[must_use]
    pub fn scan<I, S>(&self, domains: I) -> ScanBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScanBuilder::new(self, domains.into_iter().map(Into::into).collect())
    }

    /// Resolver address this client talks to
    #[must_use]
    pub fn resolver(&self) -> &str {
        &self.inner.resolver
    }

    /// Single-query timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Dispatch rate limit for batch scans
    #[must_use]
    pub fn rate_limit(&self) -> RateLimitConfig {
        self.inner.rate_limit
    }

    /// Batch scan termination settings
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        self.inner.scan
    }

    /// A fresh token bucket for one scan run
    pub(crate) fn rate_limiter(&self) -> DefaultDirectRateLimiter {
        RateLimiter::direct(self.inner.quota)
    }

    /// Send one query over a fresh socket and wait for its answer.
    #[instrument(skip(self), fields(resolver = %self.inner.resolver))]
    pub(crate) async fn exchange(&self, query: &TlsaQuery) -> Result<Vec<TlsaRecord>> {
        let id: u16 = rand::random();
        let name = wire::query_name(query)?;
        let payload = wire::encode_query(id, name)?;
        let timeout = self.inner.timeout;

        let response = tokio::time::timeout(timeout, self.round_trip(id, &payload))
            .await
            .map_err(|_| DaneError::Timeout(timeout))??;

        if !response.is_success() {
            return Err(DaneError::Resolution {
                rcode: response.rcode.to_string(),
            });
        }

        debug!(name = %query, records = response.records.len(), "TLSA answer received");
        Ok(response.records)
    }

    /// Write the query and read until the answer with our id arrives.
    async fn round_trip(&self, id: u16, payload: &[u8]) -> Result<wire::Response> {
        let socket = transport::connect(&self.inner.resolver).await?;
        socket
            .send(payload)
            .await
            .map_err(|e| DaneError::Transport(format!("send: {e}")))?;

        let mut buf = vec![0u8; transport::MAX_MESSAGE_SIZE];
        loop {
            let len = socket
                .recv(&mut buf)
                .await
                .map_err(|e| DaneError::Transport(format!("receive: {e}")))?;

            match wire::decode_response(&buf[..len]) {
                Ok(Some(response)) if response.id == id => return Ok(response),
                Ok(Some(response)) => {
                    debug!(expected = id, got = response.id, "ignoring response for another id");
                }
                Ok(None) => debug!("ignoring non-response message"),
                Err(e) => debug!(error = %e, "ignoring undecodable message"),
            }
        }
    }
}

/// Builder for configuring a [`DaneClient`]
#[derive(Debug, Clone)]
pub struct DaneClientBuilder {
    resolver: String,
    timeout: Duration,
    rate_limit: RateLimitConfig,
    scan: ScanConfig,
}

impl DaneClientBuilder {
    /// Create a new builder for the given resolver address
    #[must_use]
    pub fn new(resolver: impl Into<String>) -> Self {
        Self {
            resolver: resolver.into(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
            scan: ScanConfig::default(),
        }
    }

    /// Set the single-query timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the batch dispatch rate limit
    #[must_use]
    pub const fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Set batch scan termination settings
    #[must_use]
    pub const fn scan(mut self, config: ScanConfig) -> Self {
        self.scan = config;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<DaneClient> {
        let resolver = self.resolver.trim().to_string();
        if resolver.is_empty() {
            return Err(DaneError::Config("resolver address is empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(DaneError::Config("timeout must be greater than zero".into()));
        }
        if self.scan.idle_timeout.is_zero() {
            return Err(DaneError::Config(
                "idle timeout must be greater than zero".into(),
            ));
        }
        let quota = self.rate_limit.quota()?;

        Ok(DaneClient {
            inner: Arc::new(ClientInner {
                resolver,
                timeout: self.timeout,
                rate_limit: self.rate_limit,
                quota,
                scan: self.scan,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = DaneClient::new("8.8.8.8:53").unwrap();
        assert_eq!(client.resolver(), "8.8.8.8:53");
        assert_eq!(client.timeout(), Duration::from_secs(2));
        assert_eq!(client.rate_limit(), RateLimitConfig::new(200, 50));
        assert_eq!(client.scan_config(), ScanConfig::default());
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(DaneClient::new("  "), Err(DaneError::Config(_))));
        assert!(DaneClient::builder("127.0.0.1:53")
            .rate_limit(RateLimitConfig::new(0, 1))
            .build()
            .is_err());
        assert!(DaneClient::builder("127.0.0.1:53")
            .timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(DaneClient::builder("127.0.0.1:53")
            .scan(ScanConfig::new().idle_timeout(Duration::ZERO))
            .build()
            .is_err());
    }
}
