use std::{
    fmt,
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use ackframe::{Datagram, PacketHeader};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

/// What happens to one transmitted datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fate {
    Deliver,
    Drop,
    Duplicate,
}

type Fault = Box<dyn FnMut(&[u8]) -> Fate + Send>;

/// Shared record of every datagram a [`LossyChannel`] transmitted, including
/// ones its fault filter dropped.
#[derive(Clone, Debug, Default)]
pub struct TransmissionLog(Arc<Mutex<Vec<Bytes>>>);

impl TransmissionLog {
    fn push(&self, datagram: Bytes) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(datagram);
    }

    /// Copy of the transmitted datagrams in order.
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Headers of the transmitted datagrams that decode cleanly.
    pub fn headers(&self) -> Vec<PacketHeader> {
        self.snapshot()
            .iter()
            .filter_map(|datagram| PacketHeader::decode(datagram).ok())
            .collect()
    }
}

/// In-memory datagram channel with deterministic faults.
///
/// Created in connected pairs by [`LossyChannel::pair`]. Once the peer is
/// dropped and its queued datagrams are drained, `receive` fails with
/// [`io::ErrorKind::NotConnected`] so engine loops terminate.
pub struct LossyChannel {
    outbound: mpsc::UnboundedSender<Bytes>,
    inbound: AsyncMutex<mpsc::UnboundedReceiver<Bytes>>,
    fault: Mutex<Fault>,
    log: TransmissionLog,
    peer: SocketAddr,
    closed: bool,
}

impl LossyChannel {
    /// Two channels delivering everything to each other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let a_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 1));
        let b_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 2));
        (Self::new(a_tx, b_rx, b_addr), Self::new(b_tx, a_rx, a_addr))
    }

    fn new(
        outbound: mpsc::UnboundedSender<Bytes>,
        inbound: mpsc::UnboundedReceiver<Bytes>,
        peer: SocketAddr,
    ) -> Self {
        Self {
            outbound,
            inbound: AsyncMutex::new(inbound),
            fault: Mutex::new(Box::new(|_: &[u8]| Fate::Deliver)),
            log: TransmissionLog::default(),
            peer,
            closed: false,
        }
    }

    /// Replace the fault filter applied to outgoing datagrams.
    #[must_use]
    pub fn with_fault(self, fault: impl FnMut(&[u8]) -> Fate + Send + 'static) -> Self {
        Self {
            fault: Mutex::new(Box::new(fault)),
            ..self
        }
    }

    /// Handle to this channel's transmission record.
    pub fn transmissions(&self) -> TransmissionLog { self.log.clone() }
}

fn closed() -> io::Error { io::Error::new(io::ErrorKind::NotConnected, "channel closed") }

#[async_trait]
impl Datagram for LossyChannel {
    async fn send(&self, bytes: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(closed());
        }
        let datagram = Bytes::copy_from_slice(bytes);
        self.log.push(datagram.clone());
        let fate = {
            let mut fault = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
            (*fault)(bytes)
        };
        let copies = match fate {
            Fate::Deliver => 1,
            Fate::Drop => 0,
            Fate::Duplicate => 2,
        };
        for _ in 0..copies {
            // A vanished peer behaves like an unreachable UDP host.
            let _ = self.outbound.send(datagram.clone());
        }
        Ok(bytes.len())
    }

    async fn receive(&self, max_bytes: usize, timeout: Duration) -> io::Result<Bytes> {
        if self.closed {
            return Err(closed());
        }
        let mut inbound = self.inbound.lock().await;
        match tokio::time::timeout(timeout, inbound.recv()).await {
            Ok(Some(datagram)) => Ok(datagram.slice(..datagram.len().min(max_bytes))),
            Ok(None) => Err(closed()),
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "receive timed out")),
        }
    }

    fn peer_addr(&self) -> SocketAddr { self.peer }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl fmt::Debug for LossyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LossyChannel")
            .field("peer", &self.peer)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
