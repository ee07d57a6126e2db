//! End-to-end checks: a loopback nameserver publishes TLSA records for a
//! loopback TLS server, and `run` is driven from a `Config`.

use std::net::SocketAddr;
use std::sync::Arc;

use hickory_client::op::{Message, MessageType, ResponseCode};
use hickory_client::rr::rdata::tlsa::{CertUsage, Matching, Selector};
use hickory_client::rr::rdata::TLSA;
use hickory_client::rr::{RData, Record};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio_rustls::TlsAcceptor;

use dane_check::{run, Config, Status};

const CERT: &[u8] = include_bytes!("fixtures/cert.der");
const KEY: &[u8] = include_bytes!("fixtures/key.der");
const SPKI_SHA256: &str = "394e83a8b03a53c2ed5e18116115ab6dc7709e397b55024da4e0791769555ee5";

async fn spawn_tls_server() -> u16 {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(
        vec![CertificateDer::from(CERT.to_vec())],
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(KEY.to_vec())),
    )
    .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            if let Ok(mut tls) = acceptor.accept(sock).await {
                let _ = tls.shutdown().await;
            }
        }
    });
    port
}

/// Answers every TLSA query with the given records and AD flag.
async fn spawn_nameserver(records: Vec<(u8, u8, u8, Vec<u8>)>, authentic: bool) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            let Ok(query) = Message::from_vec(&buf[..len]) else {
                continue;
            };
            let mut reply = Message::new();
            reply
                .set_id(query.id())
                .set_message_type(MessageType::Response)
                .set_op_code(query.op_code())
                .set_recursion_desired(true)
                .set_recursion_available(true)
                .set_authentic_data(authentic)
                .set_response_code(if records.is_empty() {
                    ResponseCode::NXDomain
                } else {
                    ResponseCode::NoError
                })
                .add_queries(query.queries().to_vec());
            if let Some(question) = query.queries().first() {
                for (usage, selector, matching, data) in &records {
                    reply.add_answer(Record::from_rdata(
                        question.name().clone(),
                        300,
                        RData::TLSA(TLSA::new(
                            CertUsage::from(*usage),
                            Selector::from(*selector),
                            Matching::from(*matching),
                            data.clone(),
                        )),
                    ));
                }
            }
            if let Ok(bytes) = reply.to_vec() {
                let _ = socket.send_to(&bytes, peer).await;
            }
        }
    });
    addr
}

fn config(port: u16, nameserver: SocketAddr) -> Config {
    Config {
        host: "localhost".into(),
        port,
        connect_host: Some("127.0.0.1".into()),
        nameserver: Some(nameserver.to_string()),
        timeout_seconds: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_authenticated_dane_ee_is_ok() {
    let port = spawn_tls_server().await;
    let nameserver =
        spawn_nameserver(vec![(3, 1, 1, hex::decode(SPKI_SHA256).unwrap())], true).await;

    let verdict = run(&config(port, nameserver)).await;
    assert_eq!(verdict.status, Status::Ok, "{verdict}");
    assert!(verdict.message.contains(&SPKI_SHA256.to_uppercase()));
    assert!(verdict.to_string().starts_with("DANE OK - "));
}

#[tokio::test]
async fn test_missing_records_is_critical() {
    let port = spawn_tls_server().await;
    let nameserver = spawn_nameserver(Vec::new(), true).await;

    let verdict = run(&config(port, nameserver)).await;
    assert_eq!(verdict.status, Status::Critical);
    assert_eq!(
        verdict.message,
        format!("No TLSA records found for _{port}._tcp.localhost.")
    );
}

#[tokio::test]
async fn test_unauthenticated_records_are_unknown() {
    let port = spawn_tls_server().await;
    let nameserver =
        spawn_nameserver(vec![(3, 1, 1, hex::decode(SPKI_SHA256).unwrap())], false).await;

    let verdict = run(&config(port, nameserver)).await;
    assert_eq!(verdict.status, Status::Unknown);
    assert!(verdict.message.contains("not DNSSEC-authenticated"));
}

#[tokio::test]
async fn test_insecure_accepts_unauthenticated_records() {
    let port = spawn_tls_server().await;
    let nameserver =
        spawn_nameserver(vec![(3, 1, 1, hex::decode(SPKI_SHA256).unwrap())], false).await;

    let verdict = run(&Config {
        insecure: true,
        ..config(port, nameserver)
    })
    .await;
    assert_eq!(verdict.status, Status::Ok, "{verdict}");
    assert!(verdict
        .message
        .ends_with(" (DNSSEC authentication not enforced)"));
}

#[tokio::test]
async fn test_mismatched_record_is_critical() {
    let port = spawn_tls_server().await;
    let nameserver = spawn_nameserver(vec![(3, 1, 1, vec![0u8; 32])], true).await;

    let verdict = run(&config(port, nameserver)).await;
    assert_eq!(verdict.status, Status::Critical);
    assert!(verdict
        .message
        .starts_with("No TLSA record matched the presented certificate"));
    assert_eq!(verdict.exit_code(), 2);
}
