//! DNS module tests.
//!
//! Lookups run against an in-process nameserver bound to loopback, so the
//! response header (and its AD flag) is fully controlled by each test.

use std::net::SocketAddr;
use std::time::Duration;

use hickory_client::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_client::rr::rdata::tlsa::{CertUsage, Matching, Selector};
use hickory_client::rr::rdata::TLSA;
use hickory_client::rr::{Name, RData, Record};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

use super::tlsa::{build_query, records_from_response};
use super::*;
use crate::dane::{CertificateUsage, TlsaRecord};
use crate::error_handling::ResolveError;

const NAME: &str = "_443._tcp.www.example.org.";

fn tlsa_answer(usage: u8, selector: u8, matching: u8, data: &[u8]) -> Record {
    Record::from_rdata(
        Name::from_ascii(NAME).unwrap(),
        300,
        RData::TLSA(TLSA::new(
            CertUsage::from(usage),
            Selector::from(selector),
            Matching::from(matching),
            data.to_vec(),
        )),
    )
}

fn response(code: ResponseCode, authentic: bool, answers: Vec<Record>) -> Message {
    let mut message = Message::new();
    message
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_response_code(code)
        .set_authentic_data(authentic);
    for answer in answers {
        message.add_answer(answer);
    }
    message
}

#[test]
fn test_tlsa_name() {
    assert_eq!(tlsa_name("www.example.org", 443), NAME);
    assert_eq!(tlsa_name("mx.example.org.", 25), "_25._tcp.mx.example.org.");
}

#[test]
fn test_query_sets_dnssec_ok_when_required() {
    let name = Name::from_ascii(NAME).unwrap();
    let message = build_query(name.clone(), true);
    assert_eq!(message.queries().len(), 1);
    assert_eq!(
        message.queries()[0].query_type(),
        hickory_client::rr::RecordType::TLSA
    );
    let edns = message.extensions().as_ref().expect("EDNS0 enabled");
    assert!(edns.dnssec_ok());
    assert_eq!(edns.max_payload(), 1280);

    let message = build_query(name, false);
    assert!(message.extensions().is_none());
}

#[test]
fn test_records_keep_answer_order() {
    let message = response(
        ResponseCode::NoError,
        true,
        vec![
            tlsa_answer(3, 1, 1, &[0x01; 32]),
            tlsa_answer(1, 0, 2, &[0x02; 64]),
            tlsa_answer(7, 9, 9, &[0x03]),
        ],
    );
    let records = records_from_response(NAME, &message, true).unwrap();
    assert_eq!(
        records,
        vec![
            TlsaRecord::new(3, 1, 1, vec![0x01; 32]),
            TlsaRecord::new(1, 0, 2, vec![0x02; 64]),
            TlsaRecord::new(7, 9, 9, vec![0x03]),
        ]
    );
    assert_eq!(records[1].usage, CertificateUsage::PkixEe);
}

#[test]
fn test_nxdomain_and_empty_answer_are_no_record() {
    let message = response(ResponseCode::NXDomain, false, vec![]);
    assert_eq!(
        records_from_response(NAME, &message, true),
        Err(ResolveError::NoRecord(NAME.to_string()))
    );
    let message = response(ResponseCode::NoError, true, vec![]);
    assert_eq!(
        records_from_response(NAME, &message, true),
        Err(ResolveError::NoRecord(NAME.to_string()))
    );
}

#[test]
fn test_missing_ad_flag() {
    let message = response(
        ResponseCode::NoError,
        false,
        vec![tlsa_answer(3, 1, 1, &[0x01; 32])],
    );
    assert_eq!(
        records_from_response(NAME, &message, true),
        Err(ResolveError::Unauthenticated(NAME.to_string()))
    );
    // Tolerated when DNSSEC is not required
    assert_eq!(records_from_response(NAME, &message, false).unwrap().len(), 1);
}

#[test]
fn test_server_failure_is_transport_error() {
    let message = response(ResponseCode::ServFail, false, vec![]);
    match records_from_response(NAME, &message, true) {
        Err(ResolveError::Transport { name, .. }) => assert_eq!(name, NAME),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn test_truncated_response_is_not_read_as_missing_policy() {
    let mut message = response(ResponseCode::NoError, true, vec![]);
    message.set_truncated(true);
    match records_from_response(NAME, &message, true) {
        Err(ResolveError::Transport { name, reason }) => {
            assert_eq!(name, NAME);
            assert_eq!(reason, "response truncated");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

fn reply_to(query: &Message, authentic: bool, answers: Vec<Record>) -> Message {
    let mut reply = response(ResponseCode::NoError, authentic, answers);
    reply
        .set_id(query.id())
        .set_recursion_desired(true)
        .set_recursion_available(true)
        .add_queries(query.queries().to_vec());
    reply
}

/// Answers one query with the given flag and answers.
async fn serve_once(authentic: bool, answers: Vec<Record>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
        let query = Message::from_vec(&buf[..len]).unwrap();
        let edns = query.extensions().as_ref().expect("query carries EDNS0");
        assert!(edns.dnssec_ok());

        let reply = reply_to(&query, authentic, answers);
        socket
            .send_to(&reply.to_vec().unwrap(), peer)
            .await
            .unwrap();
    });
    addr
}

/// Sets TC on the UDP answer and serves the full answer over TCP on the same port.
async fn serve_truncated(answers: Vec<Record>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
        let query = Message::from_vec(&buf[..len]).unwrap();
        let mut reply = reply_to(&query, true, Vec::new());
        reply.set_truncated(true);
        socket
            .send_to(&reply.to_vec().unwrap(), peer)
            .await
            .unwrap();

        let (mut stream, _) = listener.accept().await.unwrap();
        let len = stream.read_u16().await.unwrap() as usize;
        let mut query = vec![0u8; len];
        stream.read_exact(&mut query).await.unwrap();
        let query = Message::from_vec(&query).unwrap();
        let reply = reply_to(&query, true, answers).to_vec().unwrap();
        stream.write_u16(reply.len() as u16).await.unwrap();
        stream.write_all(&reply).await.unwrap();
        stream.flush().await.unwrap();
        // Keep the connection open until the client hangs up
        let _ = stream.read(&mut buf).await;
    });
    addr
}

fn query_for(nameserver: SocketAddr) -> TlsaQuery {
    TlsaQuery {
        host: "www.example.org".into(),
        port: 443,
        dnssec_required: true,
        nameserver,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_lookup_against_local_nameserver() {
    let nameserver = serve_once(true, vec![tlsa_answer(3, 1, 1, &[0xaa; 32])]).await;
    let records = lookup_tlsa(&query_for(nameserver)).await.unwrap();
    assert_eq!(records, vec![TlsaRecord::new(3, 1, 1, vec![0xaa; 32])]);
}

#[tokio::test]
async fn test_lookup_rejects_unauthenticated_answer() {
    let nameserver = serve_once(false, vec![tlsa_answer(3, 1, 1, &[0xaa; 32])]).await;
    let err = lookup_tlsa(&query_for(nameserver)).await.unwrap_err();
    assert_eq!(err, ResolveError::Unauthenticated(NAME.to_string()));
}

#[tokio::test]
async fn test_truncated_answer_is_retried_over_tcp() {
    let nameserver = serve_truncated(vec![
        tlsa_answer(3, 1, 1, &[0xaa; 32]),
        tlsa_answer(2, 0, 1, &[0xbb; 32]),
    ])
    .await;
    let records = lookup_tlsa(&query_for(nameserver)).await.unwrap();
    assert_eq!(
        records,
        vec![
            TlsaRecord::new(3, 1, 1, vec![0xaa; 32]),
            TlsaRecord::new(2, 0, 1, vec![0xbb; 32]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_lookup_times_out_on_silent_nameserver() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut query = query_for(silent.local_addr().unwrap());
    query.timeout = Duration::from_secs(2);
    match lookup_tlsa(&query).await {
        Err(ResolveError::Timeout { name, timeout }) => {
            assert_eq!(name, NAME);
            assert_eq!(timeout, Duration::from_secs(2));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    drop(silent);
}
