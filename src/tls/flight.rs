//! Write coalescing between the TLS record layer and the reliable stream.

use std::{
    fmt,
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::{
    endpoint::{Datagram, UdpEndpoint},
    stream::ReliableStream,
};

/// Buffers TLS writes and sends them as one reliable message on flush.
///
/// `rustls` hands its output to the I/O layer one record at a time. Sending
/// each record as its own message would let both peers transmit at once in
/// the middle of a handshake, which the stop-and-wait transport cannot
/// resolve. Collecting a whole flight and sending it on `poll_flush` keeps
/// the peers taking turns.
///
/// Reads pass straight through. Bytes still buffered when the peer is waiting
/// for them are never sent, so callers must flush before reading.
pub struct FlightWriter<D = UdpEndpoint> {
    inner: ReliableStream<D>,
    pending: BytesMut,
}

impl<D: Datagram + 'static> FlightWriter<D> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: ReliableStream<D>) -> Self {
        Self {
            inner,
            pending: BytesMut::new(),
        }
    }

    /// Borrow the wrapped stream.
    #[must_use]
    pub const fn get_ref(&self) -> &ReliableStream<D> { &self.inner }

    /// Mutably borrow the wrapped stream.
    pub fn get_mut(&mut self) -> &mut ReliableStream<D> { &mut self.inner }

    /// Unwrap the stream, discarding unflushed bytes.
    #[must_use]
    pub fn into_inner(self) -> ReliableStream<D> { self.inner }

    /// Bytes written but not yet flushed.
    #[must_use]
    pub fn pending(&self) -> usize { self.pending.len() }

    /// Discard unflushed bytes and close the wrapped stream.
    ///
    /// # Errors
    ///
    /// Returns any error raised while closing the endpoint.
    pub fn close(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.inner.close()
    }

    /// Send everything buffered as a single message.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.pending.is_empty() {
            let written = ready!(Pin::new(&mut self.inner).poll_write(cx, &self.pending))?;
            if written == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.pending.advance(written);
        }
        Poll::Ready(Ok(()))
    }
}

impl<D: Datagram + 'static> AsyncRead for FlightWriter<D> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<D: Datagram + 'static> AsyncWrite for FlightWriter<D> {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().pending.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}

impl<D> Unpin for FlightWriter<D> {}

impl<D> fmt::Debug for FlightWriter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlightWriter")
            .field("inner", &self.inner)
            .field("pending", &self.pending.len())
            .finish()
    }
}
