//! Command line interface for the `ackframe` echo driver.
//!
//! The positional arguments follow the order
//! `<mode> <laddr> <lport> <msg_size> <raddr> <rport> [iterations]`.

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf};

use clap::{Parser, ValueEnum};

/// Which side of the TLS session the driver plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Send stdin to the peer and print each reply.
    Client,
    /// Echo each received message back to the peer.
    Server,
}

/// Command line arguments for the `ackframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "ackframe",
    version,
    about = "TLS echo over a stop-and-wait reliable UDP transport"
)]
pub struct Cli {
    /// Role to play.
    #[arg(value_enum)]
    pub mode: Mode,
    /// Local address to bind.
    pub laddr: String,
    /// Local port to bind.
    pub lport: u16,
    /// Bytes exchanged per iteration.
    pub msg_size: NonZeroUsize,
    /// Peer address.
    pub raddr: String,
    /// Peer port.
    pub rport: u16,
    /// Number of request/reply exchanges.
    #[arg(default_value_t = 1)]
    pub iterations: u32,
    /// PEM certificate chain presented by the server and trusted by the
    /// client.
    #[arg(long, default_value = "server.crt")]
    pub cert: PathBuf,
    /// PEM private key of the server.
    #[arg(long, default_value = "server.key")]
    pub key: PathBuf,
    /// Accept any server certificate (client only).
    #[arg(long)]
    pub insecure: bool,
    /// Name the client expects in the server certificate.
    #[arg(long, default_value = "localhost")]
    pub server_name: String,
    /// Append TLS secrets in NSS key-log format to this file.
    #[arg(long)]
    pub key_log: Option<PathBuf>,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,
}
