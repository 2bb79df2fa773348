//! Inbound acceptance and duplicate suppression.
//!
//! [`ReceiveState`] decides whether an inbound fragment is new or a
//! retransmission of one already accepted, and which acknowledgement to send
//! in reply. Appending payloads and sending acknowledgements is left to the
//! engine.

use crate::frame::PacketHeader;

/// Verdict for one inbound packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceptance {
    /// A new fragment: append its payload and acknowledge with `ack`.
    Fresh {
        /// Updated receive count to echo.
        ack: u64,
    },
    /// A fragment accepted earlier: re-acknowledge `echo` and drop the payload.
    Duplicate {
        /// The duplicate's own sequence number.
        echo: u64,
    },
    /// A packet without a fragment (sequence zero), such as a stray
    /// acknowledgement. Nothing is appended or sent; a literal
    /// `sequence <= count` rule would echo `ack = 0` here.
    Stray,
}

/// Receive-side counters of one connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiveState {
    count: u64,
}

impl ReceiveState {
    /// Number of distinct fragments accepted so far.
    #[must_use]
    pub const fn count(&self) -> u64 { self.count }

    /// Classify `header`, advancing the receive count for fresh fragments.
    pub fn accept(&mut self, header: &PacketHeader) -> Acceptance {
        if header.sequence == 0 {
            return Acceptance::Stray;
        }
        if header.sequence <= self.count {
            return Acceptance::Duplicate {
                echo: header.sequence,
            };
        }
        self.count += 1;
        Acceptance::Fresh { ack: self.count }
    }
}
