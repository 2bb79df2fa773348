//! Outbound sequencing for stop-and-wait delivery.
//!
//! [`SendState`] numbers fragments and recognises the acknowledgement that
//! confirms the one in flight. It never touches the socket; the engine owns
//! the transmit loop.

use bytes::Bytes;

use super::fragment::Fragment;
use crate::frame::{Packet, PacketHeader};

/// Send-side counters of one connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendState {
    sequence: u64,
}

impl SendState {
    /// Last sequence number issued; zero before the first fragment.
    #[must_use]
    pub const fn sequence(&self) -> u64 { self.sequence }

    /// Issue the next sequence number and build the fragment carrying it.
    ///
    /// `receive_count` is piggy-backed as the packet's acknowledgement.
    pub fn stamp(&mut self, fragment: Fragment<'_>, receive_count: u64) -> Packet {
        self.sequence += 1;
        Packet::fragment(
            self.sequence,
            receive_count,
            Bytes::copy_from_slice(fragment.payload),
            fragment.last,
        )
    }

    /// Whether `response` acknowledges the fragment in flight.
    #[must_use]
    pub fn is_confirmed_by(&self, response: &PacketHeader) -> bool {
        self.sequence != 0 && response.ack == self.sequence
    }
}
