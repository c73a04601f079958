//! Rate-limited batch TLSA scans over one shared resolver socket.
//!
//! A scan runs two activities against the same UDP socket. The dispatcher
//! walks the domain list, waits for a rate-limit token and writes one query per
//! domain using the list position as transaction id. The collector reads
//! whatever arrives, matches it to its query through the [`InFlight`] set and
//! classifies the domain as `YES` or `NO`.

use crate::inflight::{Claim, InFlight, Pending};
use crate::{transport, wire, DaneClient};
use chrono::Utc;
use dane_core::{
    Classification, DaneError, Result, ScanEntry, ScanReport, ScanRequest, StopReason,
    TlsaQuery, Transport, TRANSACTION_ID_SPACE,
};
use governor::DefaultDirectRateLimiter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Builder for one batch scan run
pub struct ScanBuilder<'a> {
    client: &'a DaneClient,
    domains: Vec<String>,
    port: String,
    transport: Transport,
    cancel: Option<CancellationToken>,
    progress: Option<UnboundedSender<ScanEntry>>,
}

impl<'a> ScanBuilder<'a> {
    pub(crate) fn new(client: &'a DaneClient, domains: Vec<String>) -> Self {
        Self {
            client,
            domains,
            port: "443".to_string(),
            transport: Transport::Tcp,
            cancel: None,
            progress: None,
        }
    }

    /// Service port label (default `443`)
    #[must_use]
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    /// Service transport label (default `tcp`)
    #[must_use]
    pub const fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Stop the scan when `token` is cancelled
    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Stream each classification to `sender` as it resolves
    #[must_use]
    pub fn progress(mut self, sender: UnboundedSender<ScanEntry>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Run the scan to completion.
    ///
    /// Only setup failures are returned as errors. Once the socket is open
    /// the scan always yields a report, including when the socket fails
    /// midway ([`StopReason::ConnectionLost`]).
    #[instrument(skip(self), fields(resolver = %self.client.resolver(), domains = self.domains.len()))]
    pub async fn send(self) -> Result<ScanReport> {
        let requested = self.domains.len();
        if requested > TRANSACTION_ID_SPACE {
            return Err(DaneError::BatchTooLarge {
                len: requested,
                max: TRANSACTION_ID_SPACE,
            });
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let socket = Arc::new(transport::connect(self.client.resolver()).await?);
        let in_flight = Arc::new(InFlight::default());
        let dispatched = Arc::new(AtomicUsize::new(0));
        let cancel = self
            .cancel
            .map_or_else(CancellationToken::new, |token| token.child_token());

        let dispatcher = Dispatcher {
            socket: Arc::clone(&socket),
            limiter: self.client.rate_limiter(),
            in_flight: Arc::clone(&in_flight),
            dispatched: Arc::clone(&dispatched),
            cancel: cancel.clone(),
            port: self.port,
            transport: self.transport,
        };
        let handle = tokio::spawn(dispatcher.run(self.domains));

        let scan = self.client.scan_config();
        let mut collector = Collector {
            socket,
            in_flight: Arc::clone(&in_flight),
            progress: self.progress,
            found: 0,
            entries: Vec::new(),
        };
        let stop = collector
            .run(handle, &cancel, scan.idle_timeout, scan.deadline)
            .await;
        cancel.cancel();

        let report = ScanReport {
            started_at,
            elapsed: start.elapsed(),
            requested,
            dispatched: dispatched.load(Ordering::SeqCst),
            found: collector.found,
            entries: collector.entries,
            unanswered: in_flight.drain_domains(),
            stop,
        };

        info!(
            found = report.found,
            dispatched = report.dispatched,
            unanswered = report.unanswered.len(),
            elapsed = ?report.elapsed,
            stop = %report.stop,
            "scan finished"
        );
        Ok(report)
    }
}

/// Writes one query per domain under the rate limit
struct Dispatcher {
    socket: Arc<UdpSocket>,
    limiter: DefaultDirectRateLimiter,
    in_flight: Arc<InFlight>,
    dispatched: Arc<AtomicUsize>,
    cancel: CancellationToken,
    port: String,
    transport: Transport,
}

impl Dispatcher {
    async fn run(self, domains: Vec<String>) {
        for (index, domain) in domains.into_iter().enumerate() {
            // Batches are capped at the id space, so this never breaks early.
            let Ok(id) = u16::try_from(index) else {
                break;
            };
            let Some((pending, payload)) = self.prepare(id, domain) else {
                continue;
            };

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!(remaining_from = index, "dispatch cancelled");
                    return;
                }
                () = self.limiter.until_ready() => {}
            }

            let domain = pending.request.domain.clone();
            if !self.in_flight.register(pending) {
                warn!(%domain, id, "transaction id already in flight, skipping");
                continue;
            }

            match self.socket.send(&payload).await {
                Ok(_) => {
                    self.dispatched.fetch_add(1, Ordering::SeqCst);
                    debug!(%domain, id, "query sent");
                }
                Err(e) => {
                    self.in_flight.withdraw(id);
                    warn!(%domain, id, error = %e, "failed to send query");
                }
            }
        }
        debug!("dispatch finished");
    }

    fn prepare(&self, id: u16, domain: String) -> Option<(Pending, Vec<u8>)> {
        let built = TlsaQuery::new(&self.port, self.transport, &domain)
            .and_then(|query| wire::query_name(&query))
            .and_then(|name| wire::encode_query(id, name.clone()).map(|bytes| (name, bytes)));

        match built {
            Ok((name, payload)) => {
                let request = ScanRequest {
                    domain,
                    transaction_id: id,
                    port: self.port.clone(),
                    transport: self.transport,
                };
                Some((Pending { request, name }, payload))
            }
            Err(e) => {
                warn!(%domain, error = %e, "skipping domain");
                None
            }
        }
    }
}

/// What woke the collector up
enum Event {
    Cancelled,
    DeadlineElapsed,
    DispatchFinished(std::result::Result<(), JoinError>),
    Received(std::io::Result<usize>),
    Idle,
}

/// Reads responses and classifies the domains they belong to
struct Collector {
    socket: Arc<UdpSocket>,
    in_flight: Arc<InFlight>,
    progress: Option<UnboundedSender<ScanEntry>>,
    found: usize,
    entries: Vec<ScanEntry>,
}

impl Collector {
    async fn run(
        &mut self,
        mut dispatcher: JoinHandle<()>,
        cancel: &CancellationToken,
        idle_timeout: Duration,
        deadline: Option<Duration>,
    ) -> StopReason {
        let deadline = deadline.map(|d| Instant::now() + d);
        let mut dispatch_done = false;
        let mut buf = vec![0u8; transport::MAX_MESSAGE_SIZE];

        let stop = loop {
            if dispatch_done && self.in_flight.is_empty() {
                break StopReason::Completed;
            }

            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => Event::Cancelled,
                () = wait_until(deadline) => Event::DeadlineElapsed,
                joined = &mut dispatcher, if !dispatch_done => Event::DispatchFinished(joined),
                read = self.socket.recv(&mut buf) => Event::Received(read),
                () = idle(dispatch_done, idle_timeout) => Event::Idle,
            };

            match event {
                Event::Cancelled => break StopReason::Cancelled,
                Event::DeadlineElapsed => break StopReason::DeadlineElapsed,
                Event::Idle => break StopReason::IdleTimeout,
                Event::DispatchFinished(joined) => {
                    dispatch_done = true;
                    if let Err(e) = joined {
                        warn!(error = %e, "dispatcher task failed");
                    }
                }
                Event::Received(Ok(len)) => self.handle(&buf[..len]),
                Event::Received(Err(e)) => {
                    warn!(error = %e, "resolver socket failed");
                    break StopReason::ConnectionLost {
                        error: e.to_string(),
                    };
                }
            }
        };

        if !dispatch_done {
            dispatcher.abort();
        }
        stop
    }

    fn handle(&mut self, bytes: &[u8]) {
        let response = match wire::decode_response(bytes) {
            Ok(Some(response)) => response,
            Ok(None) => {
                debug!("ignoring non-response message");
                return;
            }
            Err(e) => {
                debug!(error = %e, "ignoring undecodable message");
                return;
            }
        };

        let pending = match self.in_flight.claim(response.id, response.question.as_ref()) {
            Claim::Matched(pending) => pending,
            Claim::Unknown => {
                debug!(id = response.id, "ignoring response with unknown transaction id");
                return;
            }
            Claim::Mismatch(name) => {
                debug!(id = response.id, question = %name, "ignoring response for another name");
                return;
            }
        };

        let (classification, rcode) = if !response.is_success() {
            (Classification::No, Some(response.rcode.to_string()))
        } else if response.records.is_empty() {
            (Classification::No, None)
        } else {
            self.found += 1;
            (Classification::Yes, None)
        };

        let entry = ScanEntry {
            domain: pending.request.domain,
            transaction_id: response.id,
            classification,
            rcode,
        };
        info!("{entry}");

        if let Some(progress) = &self.progress {
            // A dropped receiver only means nobody is watching.
            let _ = progress.send(entry.clone());
        }
        self.entries.push(entry);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Idle timer, armed only once dispatch has finished
async fn idle(armed: bool, timeout: Duration) {
    if armed {
        tokio::time::sleep(timeout).await;
    } else {
        std::future::pending::<()>().await;
    }
}
