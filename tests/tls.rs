//! TLS sessions running over the reliable stream.

use std::{collections::BTreeMap, fs, path::PathBuf, sync::Arc};

use ackframe::{
    Datagram,
    ReliableTransport,
    Packet,
    tls::{
        ClientStream,
        KeyLogWriter,
        ServerStream,
        SkipServerVerification,
        load_certificates,
        load_private_key,
    },
    tls_client,
    tls_server,
};
use ackframe_testing::{LossyChannel, TransmissionLog, loopback_pair};
use rustls::{
    ClientConfig,
    RootCertStore,
    ServerConfig,
    crypto::{CryptoProvider, ring},
    pki_types::ServerName,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn provider() -> Arc<CryptoProvider> { Arc::new(ring::default_provider()) }

fn server_config() -> ServerConfig {
    let mut config = ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(
            load_certificates(fixture("localhost.crt")).expect("certificate"),
            load_private_key(fixture("localhost.key")).expect("key"),
        )
        .expect("server config");
    config.send_tls13_tickets = 0;
    config
}

fn trusting_client_config() -> ClientConfig {
    let mut roots = RootCertStore::empty();
    for cert in load_certificates(fixture("localhost.crt")).expect("certificate") {
        roots.add(cert).expect("trust anchor");
    }
    ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_root_certificates(roots)
        .with_no_client_auth()
}

fn name(server_name: &str) -> ServerName<'static> {
    ServerName::try_from(server_name.to_owned()).expect("server name")
}

async fn request_reply<C, S>(client: &mut C, server: &mut S, request: &[u8], reply: &[u8])
where
    C: AsyncRead + AsyncWrite + Unpin,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let client_side = async {
        client.write_all(request).await.expect("client write");
        client.flush().await.expect("client flush");
        let mut received = vec![0; reply.len()];
        client.read_exact(&mut received).await.expect("client read");
        received
    };
    let server_side = async {
        let mut received = vec![0; request.len()];
        server.read_exact(&mut received).await.expect("server read");
        server.write_all(reply).await.expect("server write");
        server.flush().await.expect("server flush");
        received
    };
    let (client_got, server_got) = tokio::join!(client_side, server_side);
    assert_eq!(server_got, request);
    assert_eq!(client_got, reply);
}

async fn handshake<D: Datagram + 'static>(
    a: D,
    b: D,
    client: ClientConfig,
    server_name: &str,
) -> (
    ClientStream<D>,
    ServerStream<D>,
) {
    let (client, server) = tokio::join!(
        tls_client(ReliableTransport::new(a), Arc::new(client), name(server_name)),
        tls_server(ReliableTransport::new(b), Arc::new(server_config())),
    );
    (client.expect("client handshake"), server.expect("server handshake"))
}

#[tokio::test]
async fn echo_over_loopback_udp() {
    let (a, b) = loopback_pair().await.expect("bind loopback pair");
    let (mut client, mut server) = handshake(a, b, trusting_client_config(), "localhost").await;

    request_reply(&mut client, &mut server, b"hello world", b"HELLO WORLD").await;
    let large: Vec<u8> = (0..3000u32)
        .map(|i| u8::try_from(i % 256).expect("fits in u8"))
        .collect();
    request_reply(&mut client, &mut server, &large, b"ok").await;
}

#[tokio::test]
async fn untrusted_name_fails_without_insecure_verifier() {
    let (a, b) = LossyChannel::pair();
    let (client, _server) = tokio::join!(
        tls_client(
            ReliableTransport::new(a),
            Arc::new(trusting_client_config()),
            name("elsewhere.example"),
        ),
        tls_server(ReliableTransport::new(b), Arc::new(server_config())),
    );
    assert!(client.is_err());
}

#[tokio::test]
async fn insecure_verifier_accepts_any_name() {
    let (a, b) = LossyChannel::pair();
    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .dangerous()
        .with_custom_certificate_verifier(SkipServerVerification::new(provider()))
        .with_no_client_auth();
    let (mut client, mut server) = handshake(a, b, config, "elsewhere.example").await;

    request_reply(&mut client, &mut server, b"ping", b"pong").await;
}

#[tokio::test]
async fn key_log_records_session_secrets() {
    let path = std::env::temp_dir().join(format!("ackframe-tls-keylog-{}.log", std::process::id()));
    let _ = fs::remove_file(&path);
    let mut config = trusting_client_config();
    config.key_log = Arc::new(KeyLogWriter::create(&path).expect("key log"));

    let (a, b) = LossyChannel::pair();
    let (mut client, mut server) = handshake(a, b, config, "localhost").await;
    request_reply(&mut client, &mut server, b"secret", b"ok").await;

    let contents = fs::read_to_string(&path).expect("read key log");
    fs::remove_file(&path).expect("clean up");
    let labels: Vec<_> = contents
        .lines()
        .map(|line| {
            let fields: Vec<_> = line.split(' ').collect();
            assert_eq!(fields.len(), 3, "malformed line: {line}");
            assert_eq!(fields[1].len(), 64, "client random is 32 bytes");
            fields[0].to_owned()
        })
        .collect();
    assert!(labels.iter().any(|l| l == "CLIENT_TRAFFIC_SECRET_0"));
    assert!(labels.iter().any(|l| l == "SERVER_TRAFFIC_SECRET_0"));
}

/// Payload of every data fragment sent, keyed and deduplicated by sequence.
fn fragments_by_sequence(log: &TransmissionLog) -> BTreeMap<u64, Packet> {
    log.snapshot()
        .iter()
        .filter_map(|datagram| Packet::decode(datagram).ok())
        .filter(|packet| packet.sequence() != 0)
        .map(|packet| (packet.sequence(), packet))
        .collect()
}

/// Number of complete TLS records laid end to end in `bytes`.
fn count_records(bytes: &[u8]) -> usize {
    let mut offset = 0;
    let mut records = 0;
    while let Some(header) = bytes.get(offset..offset + 5) {
        let len = usize::from(u16::from_be_bytes([header[3], header[4]]));
        offset += 5 + len;
        records += 1;
    }
    assert_eq!(offset, bytes.len(), "records must tile the message exactly");
    records
}

#[tokio::test]
async fn each_handshake_flight_travels_as_one_message() {
    let (a, b) = LossyChannel::pair();
    let client_log = a.transmissions();
    let server_log = b.transmissions();
    let (mut client, mut server) = handshake(a, b, trusting_client_config(), "localhost").await;

    let server_fragments = fragments_by_sequence(&server_log);
    let server_messages = server_fragments.values().filter(|p| p.is_last()).count();
    assert_eq!(server_messages, 1, "server flight split across messages");
    let flight: Vec<u8> = server_fragments
        .values()
        .flat_map(|p| p.payload().iter().copied())
        .collect();
    assert!(
        count_records(&flight) >= 3,
        "server flight should hold several records"
    );

    let client_messages = fragments_by_sequence(&client_log)
        .values()
        .filter(|p| p.is_last())
        .count();
    assert_eq!(client_messages, 2, "client hello, then client finished");

    request_reply(&mut client, &mut server, b"after handshake", b"ok").await;
}
