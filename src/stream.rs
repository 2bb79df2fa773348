//! Byte-stream adapter over the reliable transport.
//!
//! [`ReliableStream`] lets stream-oriented protocols such as TLS run over a
//! [`ReliableTransport`]. Each write becomes one reliable message. Each
//! received message is buffered, so readers asking for fewer bytes than a
//! message holds receive the remainder on later reads without another
//! transport receive.
//!
//! The transport runs one operation at a time. While a receive or send is
//! outstanding the transport lives inside a boxed future and comes back when
//! that future completes. A read issued while a write is outstanding first
//! finishes the write and keeps its result for the next `poll_write`, then
//! yields once before starting a receive. A write
//! issued while a read is outstanding first finishes the read and buffers the
//! message. Peers must therefore take turns: a read that waits for data the
//! local side has not yet asked for will block a following write.

use std::{
    future::Future,
    io,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll, ready},
    time::Instant,
};

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::{
    endpoint::{Datagram, UdpEndpoint},
    transport::{ReliableTransport, TransportError},
};

type Completion<D, T> = BoxFuture<'static, (ReliableTransport<D>, Result<T, TransportError>)>;

enum Outstanding<D> {
    Receive(Completion<D, Bytes>),
    Send(Completion<D, usize>),
}

/// Ordered byte stream backed by reliable messages.
///
/// Both [`local_addr`](Self::local_addr) and [`peer_addr`](Self::peer_addr)
/// report the peer address fixed at construction. Deadline setters are
/// accepted and ignored; timing is governed by the transport's
/// [`TransportConfig`](crate::TransportConfig).
///
/// A write finished by an intervening read reports its byte count to the next
/// `poll_write`, whatever buffer that call passes. Callers must retry a
/// pending write with the same leading bytes, as `write_all` and `rustls` do.
pub struct ReliableStream<D = UdpEndpoint> {
    transport: Option<ReliableTransport<D>>,
    outstanding: Option<Outstanding<D>>,
    unread: BytesMut,
    received: Option<Result<Bytes, TransportError>>,
    sent: Option<Result<usize, TransportError>>,
    peer: SocketAddr,
}

impl<D: Datagram + 'static> ReliableStream<D> {
    /// Wrap `transport`, taking ownership of it.
    #[must_use]
    pub fn new(transport: ReliableTransport<D>) -> Self {
        let peer = transport.peer_addr();
        Self {
            transport: Some(transport),
            outstanding: None,
            unread: BytesMut::new(),
            received: None,
            sent: None,
            peer,
        }
    }

    /// Borrow the transport when no operation is outstanding.
    #[must_use]
    pub fn transport(&self) -> Option<&ReliableTransport<D>> { self.transport.as_ref() }

    /// Number of received bytes not yet read.
    #[must_use]
    pub fn buffered(&self) -> usize { self.unread.len() }

    /// Peer address recorded at construction.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr { self.peer }

    /// Reports the peer address; the adapter does not track a local one.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr { self.peer }

    /// Accepted and ignored.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn set_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> { Ok(()) }

    /// Accepted and ignored.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn set_read_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> { Ok(()) }

    /// Accepted and ignored.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn set_write_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> { Ok(()) }

    /// Close the underlying endpoint.
    ///
    /// An outstanding operation is abandoned and its transport dropped.
    ///
    /// # Errors
    ///
    /// Returns any error raised while closing the endpoint.
    pub fn close(&mut self) -> io::Result<()> {
        self.outstanding = None;
        match self.transport.as_mut() {
            Some(transport) => Ok(transport.close()?),
            None => Ok(()),
        }
    }

    fn take_transport(&mut self) -> io::Result<ReliableTransport<D>> {
        self.transport
            .take()
            .ok_or_else(|| TransportError::Closed.into())
    }

    fn start_receive(&mut self, capacity_hint: usize) -> io::Result<()> {
        let mut transport = self.take_transport()?;
        self.outstanding = Some(Outstanding::Receive(Box::pin(async move {
            let result = transport.recv(capacity_hint).await;
            (transport, result)
        })));
        Ok(())
    }

    fn start_send(&mut self, message: &[u8]) -> io::Result<()> {
        let mut transport = self.take_transport()?;
        let message = Bytes::copy_from_slice(message);
        self.outstanding = Some(Outstanding::Send(Box::pin(async move {
            let result = transport.send(&message).await;
            (transport, result)
        })));
        Ok(())
    }

    /// Drive the outstanding operation to completion, parking its result.
    fn poll_outstanding(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.outstanding.as_mut() {
            None => {}
            Some(Outstanding::Receive(future)) => {
                let (transport, result) = ready!(future.as_mut().poll(cx));
                self.transport = Some(transport);
                self.received = Some(result);
                self.outstanding = None;
            }
            Some(Outstanding::Send(future)) => {
                let (transport, result) = ready!(future.as_mut().poll(cx));
                self.transport = Some(transport);
                self.sent = Some(result);
                self.outstanding = None;
            }
        }
        Poll::Ready(())
    }

    fn is_sending(&self) -> bool { matches!(self.outstanding, Some(Outstanding::Send(_))) }
}

impl<D: Datagram + 'static> AsyncRead for ReliableStream<D> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        loop {
            if !this.unread.is_empty() {
                let len = this.unread.len().min(buf.remaining());
                buf.put_slice(&this.unread.split_to(len));
                return Poll::Ready(Ok(()));
            }
            if let Some(result) = this.received.take() {
                this.unread.extend_from_slice(&result?);
                continue;
            }
            if this.outstanding.is_some() {
                let finishing_send = this.is_sending();
                ready!(this.poll_outstanding(cx));
                if finishing_send {
                    // Yield so a caller reading speculatively can collect the
                    // write before a receive claims the transport.
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                continue;
            }
            this.start_receive(buf.remaining())?;
        }
    }
}

impl<D: Datagram + 'static> AsyncWrite for ReliableStream<D> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        loop {
            if let Some(result) = this.sent.take() {
                return Poll::Ready(result.map_err(Into::into));
            }
            if this.outstanding.is_some() {
                ready!(this.poll_outstanding(cx));
                continue;
            }
            if buf.is_empty() {
                return Poll::Ready(Ok(0));
            }
            this.start_send(buf)?;
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.is_sending() {
            ready!(this.poll_outstanding(cx));
        }
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.is_sending() {
            ready!(this.poll_outstanding(cx));
        }
        Poll::Ready(this.close())
    }
}

impl<D> Unpin for ReliableStream<D> {}

impl<D> std::fmt::Debug for ReliableStream<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReliableStream")
            .field("peer", &self.peer)
            .field("unread", &self.unread.len())
            .field("outstanding", &self.outstanding.is_some())
            .finish_non_exhaustive()
    }
}
