//! TLSA record lookup.
//!
//! Queries are sent directly to one nameserver so the response header,
//! and with it the DNSSEC Authenticated-Data flag, can be inspected. A
//! truncated UDP answer is repeated over TCP.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hickory_client::client::AsyncClient;
use hickory_client::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_client::proto::error::{ProtoError, ProtoErrorKind};
use hickory_client::proto::iocompat::AsyncIoTokioAsStd;
use hickory_client::proto::tcp::TcpClientStream;
use hickory_client::proto::xfer::{DnsHandle, DnsRequest, DnsRequestOptions, FirstAnswer};
use hickory_client::rr::{Name, RData, RecordType};
use hickory_client::udp::UdpClientStream;
use tokio::net::{TcpStream, UdpSocket};

use crate::config::EDNS_MAX_PAYLOAD;
use crate::dane::TlsaRecord;
use crate::error_handling::ResolveError;

/// Parameters of one TLSA lookup.
#[derive(Debug, Clone)]
pub struct TlsaQuery {
    /// Hostname of the service
    pub host: String,
    /// TCP port of the service
    pub port: u16,
    /// Fail unless the response carries the Authenticated-Data flag
    pub dnssec_required: bool,
    /// Nameserver to query
    pub nameserver: SocketAddr,
    /// Timeout for the whole query
    pub timeout: Duration,
}

impl TlsaQuery {
    /// Absolute TLSA owner name, e.g. `_443._tcp.www.example.org.`
    pub fn name(&self) -> String {
        tlsa_name(&self.host, self.port)
    }
}

/// Builds the TLSA owner name `_{port}._tcp.{host}.` for a service.
pub fn tlsa_name(host: &str, port: u16) -> String {
    let host = host.trim_end_matches('.');
    format!("_{port}._tcp.{host}.")
}

/// Builds the query message, with EDNS0 and the DO bit when DNSSEC is required.
pub(crate) fn build_query(name: Name, dnssec_required: bool) -> Message {
    let mut message = Message::new();
    message
        .add_query(Query::query(name, RecordType::TLSA))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    if dnssec_required {
        let mut edns = Edns::new();
        edns.set_max_payload(EDNS_MAX_PAYLOAD);
        edns.set_dnssec_ok(true);
        message.set_edns(edns);
        message.set_authentic_data(true);
    }
    message
}

/// Extracts the TLSA records of a response, in answer order.
///
/// A missing name or an empty answer is reported before the DNSSEC check,
/// so an absent policy always reads as "no record". A truncated response
/// is never read as an absent policy.
pub(crate) fn records_from_response(
    name: &str,
    response: &Message,
    dnssec_required: bool,
) -> Result<Vec<TlsaRecord>, ResolveError> {
    match response.response_code() {
        ResponseCode::NoError => {}
        ResponseCode::NXDomain => return Err(ResolveError::NoRecord(name.to_string())),
        code => {
            return Err(ResolveError::Transport {
                name: name.to_string(),
                reason: format!("server answered {code}"),
            })
        }
    }
    if response.truncated() {
        return Err(ResolveError::Transport {
            name: name.to_string(),
            reason: "response truncated".to_string(),
        });
    }

    let records: Vec<TlsaRecord> = response
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::TLSA(tlsa)) => Some(TlsaRecord::new(
                tlsa.cert_usage().into(),
                tlsa.selector().into(),
                tlsa.matching().into(),
                tlsa.cert_data().to_vec(),
            )),
            _ => None,
        })
        .collect();
    if records.is_empty() {
        return Err(ResolveError::NoRecord(name.to_string()));
    }

    if dnssec_required && !response.header().authentic_data() {
        return Err(ResolveError::Unauthenticated(name.to_string()));
    }
    Ok(records)
}

fn classify_proto_error(name: &str, timeout: Duration, error: &ProtoError) -> ResolveError {
    match error.kind() {
        ProtoErrorKind::Timeout => ResolveError::Timeout {
            name: name.to_string(),
            timeout,
        },
        _ => ResolveError::Transport {
            name: name.to_string(),
            reason: error.to_string(),
        },
    }
}

async fn send_query<B>(
    client: AsyncClient,
    background: B,
    message: Message,
) -> Result<Message, ProtoError>
where
    B: Future<Output = Result<(), ProtoError>> + Send + 'static,
{
    let background = tokio::spawn(background);
    let response = client
        .send(DnsRequest::new(message, DnsRequestOptions::default()))
        .first_answer()
        .await;
    background.abort();
    response.map(|response| response.into_message())
}

async fn exchange_udp(query: &TlsaQuery, message: Message) -> Result<Message, ProtoError> {
    let stream = UdpClientStream::<UdpSocket>::with_timeout(query.nameserver, query.timeout);
    let (client, background) = AsyncClient::connect(stream).await?;
    send_query(client, background, message).await
}

async fn exchange_tcp(query: &TlsaQuery, message: Message) -> Result<Message, ProtoError> {
    let (stream, sender) = TcpClientStream::<AsyncIoTokioAsStd<TcpStream>>::with_timeout(
        query.nameserver,
        query.timeout,
    );
    let (client, background) = AsyncClient::new(stream, sender, None).await?;
    send_query(client, background, message).await
}

async fn exchange(query: &TlsaQuery, name: &str, fqdn: Name) -> Result<Message, ResolveError> {
    let message = build_query(fqdn, query.dnssec_required);
    let response = exchange_udp(query, message.clone())
        .await
        .map_err(|e| classify_proto_error(name, query.timeout, &e))?;
    if !response.truncated() {
        return Ok(response);
    }

    log::debug!("UDP answer for {name} truncated, retrying over TCP");
    exchange_tcp(query, message)
        .await
        .map_err(|e| classify_proto_error(name, query.timeout, &e))
}

/// Looks up the TLSA records of a service.
///
/// # Errors
///
/// - [`ResolveError::NoRecord`] if the name does not exist or has no TLSA records
/// - [`ResolveError::Timeout`] if no answer arrives within the timeout, which
///   covers the TCP retry of a truncated answer
/// - [`ResolveError::Unauthenticated`] if DNSSEC is required but the AD flag is unset
/// - [`ResolveError::Transport`] for any other failure
pub async fn lookup_tlsa(query: &TlsaQuery) -> Result<Vec<TlsaRecord>, ResolveError> {
    let name = query.name();
    let fqdn = Name::from_ascii(&name).map_err(|e| ResolveError::InvalidName {
        name: name.clone(),
        reason: e.to_string(),
    })?;
    log::info!(
        "Querying TLSA {name} at {} (DNSSEC {})",
        query.nameserver,
        if query.dnssec_required {
            "required"
        } else {
            "not required"
        }
    );

    let response = match tokio::time::timeout(query.timeout, exchange(query, &name, fqdn)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ResolveError::Timeout {
                name,
                timeout: query.timeout,
            })
        }
    };

    let records = records_from_response(&name, &response, query.dnssec_required)?;
    log::debug!(
        "Resolved {} TLSA record(s) for {name} (AD={})",
        records.len(),
        response.header().authentic_data()
    );
    Ok(records)
}
