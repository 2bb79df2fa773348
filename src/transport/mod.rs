//! Stop-and-wait reliable messaging over a [`Datagram`] channel.
//!
//! [`ReliableTransport`] turns an unreliable datagram channel into an ordered,
//! message-oriented one:
//!
//! - [`send`](ReliableTransport::send) splits a message into fragments and
//!   transmits each one until the peer acknowledges it, one fragment in flight
//!   at a time.
//! - [`recv`](ReliableTransport::recv) accepts fragments in sequence,
//!   acknowledges every one, re-acknowledges retransmissions without
//!   appending them again, and returns once the final fragment arrives.
//!
//! Sequence numbers count fragments, not bytes. Acknowledgements are
//! cumulative fragment counts and are piggy-backed on data fragments.

mod error;
mod fragment;
mod receiver;
mod sender;

use bytes::{Bytes, BytesMut};
pub use error::TransportError;
pub use fragment::{Fragment, Fragments, fragment_count};
use log::{debug, trace, warn};
pub use receiver::{Acceptance, ReceiveState};
pub use sender::SendState;

use crate::{
    config::TransportConfig,
    endpoint::{Datagram, UdpEndpoint, is_closed},
    frame::{HEADER_SIZE, Packet, PacketHeader},
    metrics::{self, Direction},
};

/// Reliable, ordered message transport bound to one peer.
///
/// The transport exclusively owns its channel and counters; `send` and `recv`
/// take `&mut self`, so at most one operation runs at a time.
#[derive(Debug)]
pub struct ReliableTransport<D = UdpEndpoint> {
    channel: D,
    config: TransportConfig,
    sender: SendState,
    receiver: ReceiveState,
}

impl ReliableTransport<UdpEndpoint> {
    /// Bind `local` and target `remote` over UDP with the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Resolve`] or [`TransportError::Bind`] when
    /// the endpoint cannot be set up.
    pub async fn bind(local: &str, remote: &str) -> Result<Self, TransportError> {
        Ok(Self::new(UdpEndpoint::bind(local, remote).await?))
    }
}

impl<D: Datagram> ReliableTransport<D> {
    /// Wrap `channel` with the default configuration.
    #[must_use]
    pub fn new(channel: D) -> Self { Self::with_config(channel, TransportConfig::default()) }

    /// Wrap `channel` with an explicit configuration.
    #[must_use]
    pub fn with_config(channel: D, config: TransportConfig) -> Self {
        Self {
            channel,
            config,
            sender: SendState::default(),
            receiver: ReceiveState::default(),
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig { &self.config }

    /// Borrow the underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &D { &self.channel }

    /// Last sequence number issued to an outbound fragment.
    #[must_use]
    pub const fn send_sequence(&self) -> u64 { self.sender.sequence() }

    /// Number of distinct fragments accepted from the peer.
    #[must_use]
    pub const fn receive_count(&self) -> u64 { self.receiver.count() }

    /// Address of the peer.
    #[must_use]
    pub fn peer_addr(&self) -> std::net::SocketAddr { self.channel.peer_addr() }

    /// Deliver `message` as one reliable message.
    ///
    /// Returns the number of payload bytes delivered, which equals
    /// `message.len()`. An empty message sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unconfirmed`] when a fragment exhausts the
    /// attempt ceiling; later fragments are not sent. Returns
    /// [`TransportError::Closed`] when the channel has been closed.
    pub async fn send(&mut self, message: &[u8]) -> Result<usize, TransportError> {
        let mut delivered = 0;
        for fragment in Fragments::new(message, self.config.get_fragment_size()) {
            let packet = self.sender.stamp(fragment, self.receiver.count());
            self.deliver(&packet.encode()).await?;
            delivered += fragment.payload.len();
        }
        if delivered > 0 {
            metrics::inc_messages(Direction::Outbound);
        }
        Ok(delivered)
    }

    /// Transmit one encoded fragment until it is acknowledged or the attempt
    /// ceiling is reached.
    async fn deliver(&self, encoded: &[u8]) -> Result<(), TransportError> {
        let attempts = self.config.get_max_attempts().get();
        for attempt in 0..attempts {
            if attempt > 0 {
                metrics::inc_retransmissions();
            }
            match self.channel.send(encoded).await {
                Ok(_) => metrics::inc_fragments_sent(),
                Err(err) if is_closed(&err) => return Err(TransportError::Closed),
                Err(err) => trace!("fragment send failed: error={err}"),
            }

            let response = match self
                .channel
                .receive(HEADER_SIZE, self.config.get_receive_timeout())
                .await
            {
                Ok(response) if response.is_empty() => continue,
                Ok(response) => response,
                Err(err) if is_closed(&err) => return Err(TransportError::Closed),
                Err(_) => continue,
            };
            match PacketHeader::decode(&response) {
                Ok(header) if self.sender.is_confirmed_by(&header) => return Ok(()),
                Ok(header) => trace!(
                    "ignoring response: ack={}, expected={}",
                    header.ack,
                    self.sender.sequence()
                ),
                Err(err) => {
                    metrics::inc_malformed();
                    debug!("discarding malformed response: {err}");
                }
            }
        }

        let sequence = self.sender.sequence();
        metrics::inc_unconfirmed();
        warn!("fragment unconfirmed: sequence={sequence}, attempts={attempts}");
        Err(TransportError::Unconfirmed { sequence, attempts })
    }

    /// Wait for the next complete message from the peer.
    ///
    /// `capacity_hint` pre-sizes the reassembly buffer. The call returns only
    /// once a final fragment arrives; it has no overall deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the channel has been closed.
    pub async fn recv(&mut self, capacity_hint: usize) -> Result<Bytes, TransportError> {
        let mut message = BytesMut::with_capacity(capacity_hint);
        let max_datagram = self.config.max_datagram_size();
        loop {
            let datagram = match self
                .channel
                .receive(max_datagram, self.config.get_receive_timeout())
                .await
            {
                Ok(datagram) if datagram.is_empty() => continue,
                Ok(datagram) => datagram,
                Err(err) if is_closed(&err) => return Err(TransportError::Closed),
                Err(_) => continue,
            };
            let packet = match Packet::decode(&datagram) {
                Ok(packet) => packet,
                Err(err) => {
                    metrics::inc_malformed();
                    debug!("discarding malformed datagram: {err}");
                    continue;
                }
            };

            match self.receiver.accept(packet.header()) {
                Acceptance::Stray => {}
                Acceptance::Duplicate { echo } => {
                    metrics::inc_duplicates();
                    debug!(
                        "duplicate fragment: sequence={echo}, receive_count={}",
                        self.receiver.count()
                    );
                    self.send_ack(echo).await;
                }
                Acceptance::Fresh { ack } => {
                    let last = packet.is_last();
                    message.extend_from_slice(packet.payload());
                    self.send_ack(ack).await;
                    if last {
                        metrics::inc_messages(Direction::Inbound);
                        trace!("message reassembled: bytes={}, receive_count={ack}", message.len());
                        return Ok(message.freeze());
                    }
                }
            }
        }
    }

    /// Send a pure acknowledgement carrying `ack`.
    ///
    /// Acknowledgements are fire-and-forget; failures are only logged.
    pub async fn send_ack(&self, ack: u64) {
        let packet = Packet::acknowledgement(ack);
        if let Err(err) = self.channel.send(&packet.encode()).await {
            trace!("acknowledgement send failed: ack={ack}, error={err}");
        }
    }

    /// Close the underlying channel.
    ///
    /// # Errors
    ///
    /// Returns any error raised while releasing the channel.
    pub fn close(&mut self) -> Result<(), TransportError> { Ok(self.channel.close()?) }
}
