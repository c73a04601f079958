//! DNS message encoding and decoding via `hickory-proto`.

use dane_core::{DaneError, Result, TlsaQuery, TlsaRecord};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::TLSA;
use hickory_proto::rr::{Name, RData, RecordType};

/// The parts of a DNS response this crate consumes
#[derive(Debug, Clone)]
pub(crate) struct Response {
    /// Transaction id echoed by the resolver
    pub id: u16,
    /// Response code
    pub rcode: ResponseCode,
    /// First question, if the resolver echoed it
    pub question: Option<Name>,
    /// TLSA records from the answer section, in order
    pub records: Vec<TlsaRecord>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.rcode == ResponseCode::NoError
    }
}

/// Parse a query name into a wire name.
pub(crate) fn query_name(query: &TlsaQuery) -> Result<Name> {
    Name::from_ascii(query.name())
        .map_err(|e| DaneError::InvalidQuery(format!("{}: {e}", query.name())))
}

/// Encode a recursive TLSA query with the given transaction id.
pub(crate) fn encode_query(id: u16, name: Name) -> Result<Vec<u8>> {
    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, RecordType::TLSA));

    message
        .to_vec()
        .map_err(|e| DaneError::Protocol(format!("encode query: {e}")))
}

/// Decode a message from the resolver.
///
/// Returns `Ok(None)` for anything that is not a response.
pub(crate) fn decode_response(bytes: &[u8]) -> Result<Option<Response>> {
    let message =
        Message::from_vec(bytes).map_err(|e| DaneError::Protocol(format!("decode: {e}")))?;

    if message.message_type() != MessageType::Response {
        return Ok(None);
    }

    let records = message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::TLSA(tlsa) => Some(convert(tlsa)),
            _ => None,
        })
        .collect();

    Ok(Some(Response {
        id: message.id(),
        rcode: message.response_code(),
        question: message.queries().first().map(|q| q.name().clone()),
        records,
    }))
}

fn convert(tlsa: &TLSA) -> TlsaRecord {
    TlsaRecord::new(
        u8::from(tlsa.cert_usage()).into(),
        u8::from(tlsa.selector()).into(),
        u8::from(tlsa.matching()).into(),
        tlsa.cert_data().to_vec(),
    )
}
