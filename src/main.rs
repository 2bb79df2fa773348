//! TLS echo driver for the `ackframe` transport.
//!
//! The client sends stdin to the server once per iteration and prints each
//! reply; the server echoes every message back, zero padded to `msg_size`.

mod cli;

use std::{error::Error, sync::Arc};

use ackframe::{
    ReliableTransport,
    tls::{KeyLogWriter, SkipServerVerification, load_certificates, load_private_key},
    tls_client,
    tls_server,
};
use clap::Parser;
use cli::{Cli, Mode};
use rustls::{
    ClientConfig,
    RootCertStore,
    ServerConfig,
    crypto::{CryptoProvider, ring},
    pki_types::ServerName,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(err) = run(Cli::parse()).await {
        error!(error = %err, "ackframe failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    install_metrics_exporter(&cli)?;

    let local = join_host_port(&cli.laddr, cli.lport);
    let remote = join_host_port(&cli.raddr, cli.rport);
    let transport = ReliableTransport::bind(&local, &remote).await?;
    info!(%local, %remote, mode = ?cli.mode, "transport bound");

    let provider = Arc::new(ring::default_provider());
    match cli.mode {
        Mode::Client => {
            let config = client_config(&cli, provider)?;
            let server_name = ServerName::try_from(cli.server_name.clone())?;
            let mut tls = tls_client(transport, Arc::new(config), server_name).await?;
            info!("handshake complete");
            run_client(&mut tls, &cli).await?;
            tls.get_mut().0.close()?;
        }
        Mode::Server => {
            let config = server_config(&cli, provider)?;
            let mut tls = tls_server(transport, Arc::new(config)).await?;
            info!("handshake complete");
            run_server(&mut tls, &cli).await?;
            tls.get_mut().0.close()?;
        }
    }
    Ok(())
}

/// Format `host:port`, bracketing IPv6 literals.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(cli: &Cli) -> Result<(), BoxError> {
    if let Some(addr) = cli.metrics_listen {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "metrics exporter listening");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(cli: &Cli) -> Result<(), BoxError> {
    if cli.metrics_listen.is_some() {
        warn!("built without the metrics feature; ignoring --metrics-listen");
    }
    Ok(())
}

fn client_config(cli: &Cli, provider: Arc<CryptoProvider>) -> Result<ClientConfig, BoxError> {
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;
    let mut config = if cli.insecure {
        warn!("server certificate verification disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(SkipServerVerification::new(provider))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        for cert in load_certificates(&cli.cert)? {
            roots.add(cert)?;
        }
        builder.with_root_certificates(roots).with_no_client_auth()
    };
    if let Some(path) = &cli.key_log {
        config.key_log = Arc::new(KeyLogWriter::create(path)?);
    }
    Ok(config)
}

fn server_config(cli: &Cli, provider: Arc<CryptoProvider>) -> Result<ServerConfig, BoxError> {
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(load_certificates(&cli.cert)?, load_private_key(&cli.key)?)?;
    // The transport is half duplex; unsolicited tickets would collide with the
    // client's first write.
    config.send_tls13_tickets = 0;
    if let Some(path) = &cli.key_log {
        config.key_log = Arc::new(KeyLogWriter::create(path)?);
    }
    Ok(config)
}

async fn run_client<S>(tls: &mut S, cli: &Cli) -> Result<(), BoxError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut input = Vec::new();
    tokio::io::stdin().read_to_end(&mut input).await?;
    if input.is_empty() {
        warn!("stdin was empty; nothing to send");
        return Ok(());
    }

    let mut reply = vec![0; cli.msg_size.get()];
    let mut stdout = tokio::io::stdout();
    for iteration in 1..=cli.iterations {
        tls.write_all(&input).await?;
        tls.flush().await?;
        tls.read_exact(&mut reply).await?;
        stdout.write_all(&reply).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        info!(iteration, bytes = reply.len(), "reply received");
    }
    Ok(())
}

async fn run_server<S>(tls: &mut S, cli: &Cli) -> Result<(), BoxError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0; cli.msg_size.get()];
    for iteration in 1..=cli.iterations {
        buf.fill(0);
        let read = tls.read(&mut buf).await?;
        if read == 0 {
            info!(iteration, "peer finished early");
            break;
        }
        tls.write_all(&buf).await?;
        tls.flush().await?;
        println!("{}", buf.len());
        info!(iteration, received = read, "message echoed");
    }
    Ok(())
}
