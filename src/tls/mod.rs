//! TLS over the reliable byte stream.
//!
//! The handshake and record layer come from `rustls` through `tokio-rustls`;
//! this module only wraps a [`ReliableTransport`] in a [`ReliableStream`] and
//! hands it to the TLS role. Client and server configurations are passed
//! through untouched.
//!
//! The transport carries one message at a time in either direction, so the
//! TLS peers must take turns. Records are collected by a [`FlightWriter`] and
//! sent as one message per flush, which keeps each handshake flight in a
//! single message. Application code must likewise flush after writing and
//! before reading. TLS 1.3 servers send session tickets after the handshake
//! unprompted; disable them with `ServerConfig::send_tls13_tickets = 0` when
//! the client writes first.

mod flight;
mod insecure;
mod keylog;
mod pem;

use std::{io, sync::Arc};

pub use flight::FlightWriter;
pub use insecure::SkipServerVerification;
pub use keylog::KeyLogWriter;
pub use pem::{load_certificates, load_private_key};
use rustls::{ClientConfig, ServerConfig, pki_types::ServerName};
use tokio_rustls::{TlsAcceptor, TlsConnector, client, server};

use crate::{
    endpoint::{Datagram, UdpEndpoint},
    stream::ReliableStream,
    transport::ReliableTransport,
};

/// Client end of a TLS session over the reliable transport.
pub type ClientStream<D = UdpEndpoint> = client::TlsStream<FlightWriter<D>>;

/// Server end of a TLS session over the reliable transport.
pub type ServerStream<D = UdpEndpoint> = server::TlsStream<FlightWriter<D>>;

/// Run the client side of a TLS handshake over `transport`.
///
/// # Errors
///
/// Returns the handshake failure, or the transport failure mapped into an
/// [`io::Error`].
pub async fn tls_client<D: Datagram + 'static>(
    transport: ReliableTransport<D>,
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
) -> io::Result<ClientStream<D>> {
    TlsConnector::from(config)
        .connect(server_name, FlightWriter::new(ReliableStream::new(transport)))
        .await
}

/// Run the server side of a TLS handshake over `transport`.
///
/// # Errors
///
/// Returns the handshake failure, or the transport failure mapped into an
/// [`io::Error`].
pub async fn tls_server<D: Datagram + 'static>(
    transport: ReliableTransport<D>,
    config: Arc<ServerConfig>,
) -> io::Result<ServerStream<D>> {
    TlsAcceptor::from(config)
        .accept(FlightWriter::new(ReliableStream::new(transport)))
        .await
}
