//! Datagram endpoints.
//!
//! [`Datagram`] is the seam between the reliability engine and the network:
//! best-effort transmission to a fixed peer and a receive primitive bounded by
//! a per-call timeout. [`UdpEndpoint`] implements it over a bound
//! `tokio::net::UdpSocket`. No parsing, retrying or sequencing happens here.

use std::{io, net::SocketAddr, time::Duration};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use log::debug;
use tokio::net::{UdpSocket, lookup_host};

use crate::transport::TransportError;

/// Unreliable datagram channel bound to a single peer.
///
/// Implementations report a closed channel with
/// [`io::ErrorKind::NotConnected`]; every other error is treated as transient
/// by the engine.
#[async_trait]
pub trait Datagram: Send + Sync {
    /// Transmit `bytes` as one datagram to the peer.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the underlying channel.
    async fn send(&self, bytes: &[u8]) -> io::Result<usize>;

    /// Wait up to `timeout` for one datagram of at most `max_bytes` bytes.
    ///
    /// Longer datagrams are truncated to `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::TimedOut`] when nothing arrives in time, or the
    /// underlying I/O error.
    async fn receive(&self, max_bytes: usize, timeout: Duration) -> io::Result<Bytes>;

    /// Address of the fixed peer.
    fn peer_addr(&self) -> SocketAddr;

    /// Release the channel. Later calls fail with
    /// [`io::ErrorKind::NotConnected`].
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the channel fails.
    fn close(&mut self) -> io::Result<()>;
}

pub(crate) fn is_closed(err: &io::Error) -> bool { err.kind() == io::ErrorKind::NotConnected }

fn closed() -> io::Error { io::Error::new(io::ErrorKind::NotConnected, "endpoint closed") }

/// UDP socket bound locally and aimed at one remote address.
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: Option<UdpSocket>,
    peer: SocketAddr,
}

impl UdpEndpoint {
    /// Resolve both addresses, bind `local` and target `remote`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Resolve`] when either address cannot be
    /// resolved and [`TransportError::Bind`] when the local socket cannot be
    /// bound.
    pub async fn bind(local: &str, remote: &str) -> Result<Self, TransportError> {
        let local_addr = resolve(local).await?;
        let peer = resolve(remote).await?;
        let socket = UdpSocket::bind(local_addr)
            .await
            .map_err(|source| TransportError::Bind {
                address: local_addr,
                source,
            })?;
        Ok(Self::from_socket(socket, peer))
    }

    /// Wrap an already bound socket.
    #[must_use]
    pub fn from_socket(socket: UdpSocket, peer: SocketAddr) -> Self {
        Self {
            socket: Some(socket),
            peer,
        }
    }

    /// Address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotConnected`] once closed, or the error from
    /// the operating system.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket()?.local_addr() }

    /// Whether [`close`](Datagram::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.socket.is_none() }

    fn socket(&self) -> io::Result<&UdpSocket> { self.socket.as_ref().ok_or_else(closed) }
}

async fn resolve(address: &str) -> Result<SocketAddr, TransportError> {
    let resolve_error = |source| TransportError::Resolve {
        address: address.to_owned(),
        source,
    };
    lookup_host(address)
        .await
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| {
            resolve_error(io::Error::new(
                io::ErrorKind::NotFound,
                "address resolved to nothing",
            ))
        })
}

#[async_trait]
impl Datagram for UdpEndpoint {
    async fn send(&self, bytes: &[u8]) -> io::Result<usize> {
        self.socket()?.send_to(bytes, self.peer).await
    }

    async fn receive(&self, max_bytes: usize, timeout: Duration) -> io::Result<Bytes> {
        let socket = self.socket()?;
        let mut buf = BytesMut::zeroed(max_bytes);
        let (len, _) = tokio::time::timeout(timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "receive timed out"))??;
        buf.truncate(len);
        Ok(buf.freeze())
    }

    fn peer_addr(&self) -> SocketAddr { self.peer }

    fn close(&mut self) -> io::Result<()> {
        if self.socket.take().is_some() {
            debug!("closed datagram endpoint: peer={}", self.peer);
        }
        Ok(())
    }
}
