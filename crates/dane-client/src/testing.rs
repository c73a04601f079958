//! In-process fake resolvers for tests.

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::tlsa::{CertUsage, Matching, Selector};
use hickory_proto::rr::rdata::TLSA;
use hickory_proto::rr::{RData, Record};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Association data served by [`answer_tlsa`]
pub const ASSOCIATION_DATA: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

/// A query as seen by the fake resolver
#[derive(Debug, Clone)]
pub struct Received {
    pub at: Instant,
    pub query: Message,
}

/// A UDP resolver on loopback driven by a reply function.
pub struct FakeResolver {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Vec<Received>>>,
    handle: JoinHandle<()>,
}

impl FakeResolver {
    /// Serve every query with whatever `reply` returns (possibly nothing).
    pub async fn spawn<F>(mut reply: F) -> Self
    where
        F: FnMut(&Message) -> Vec<Message> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        let handle = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let Ok(query) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                log.lock().unwrap().push(Received {
                    at: Instant::now(),
                    query: query.clone(),
                });
                for response in reply(&query) {
                    let bytes = response.to_vec().unwrap();
                    let _ = socket.send_to(&bytes, peer).await;
                }
            }
        });

        Self {
            addr,
            received,
            handle,
        }
    }

    /// Resolver address as `host:port`
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Arrival times of all queries so far
    pub fn arrivals(&self) -> Vec<Instant> {
        self.received.lock().unwrap().iter().map(|r| r.at).collect()
    }

    pub fn query_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

impl Drop for FakeResolver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Response skeleton echoing id and question
pub fn response_to(query: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(query.op_code())
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true)
        .set_response_code(ResponseCode::NoError)
        .add_queries(query.queries().to_vec());
    response
}

/// Answer with one `3 1 1` TLSA record
pub fn answer_tlsa(query: &Message) -> Message {
    let mut response = response_to(query);
    let name = query.queries()[0].name().clone();
    let tlsa = TLSA::new(
        CertUsage::from(3),
        Selector::from(1),
        Matching::from(1),
        ASSOCIATION_DATA.to_vec(),
    );
    response.add_answer(Record::from_rdata(name, 300, RData::TLSA(tlsa)));
    response
}

/// Successful answer without records
pub fn answer_empty(query: &Message) -> Message {
    response_to(query)
}

/// Answer with an error response code
pub fn answer_rcode(query: &Message, rcode: ResponseCode) -> Message {
    let mut response = response_to(query);
    response.set_response_code(rcode);
    response
}

/// Domain the query was asked for, from `_port._proto.<domain>.`
pub fn queried_domain(query: &Message) -> String {
    let name = query.queries()[0].name().to_ascii();
    name.trim_end_matches('.')
        .splitn(3, '.')
        .nth(2)
        .unwrap_or_default()
        .to_string()
}
