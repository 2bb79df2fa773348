//! Metric helpers for `ackframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Counter of fragment transmissions, including retransmissions.
pub const FRAGMENTS_SENT: &str = "ackframe_fragments_sent_total";
/// Counter of fragment retransmissions.
pub const RETRANSMISSIONS: &str = "ackframe_retransmissions_total";
/// Counter of duplicate fragments suppressed by the receiver.
pub const DUPLICATES: &str = "ackframe_duplicates_total";
/// Counter of fragments abandoned at the attempt ceiling.
pub const UNCONFIRMED: &str = "ackframe_unconfirmed_total";
/// Counter of datagrams discarded as malformed.
pub const MALFORMED: &str = "ackframe_malformed_total";
/// Counter of complete messages, labelled by direction.
pub const MESSAGES: &str = "ackframe_messages_total";

/// Direction of message flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Messages reassembled from the peer.
    Inbound,
    /// Messages delivered to the peer.
    Outbound,
}

impl Direction {
    /// Label value used for this direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

macro_rules! increment {
    ($name:expr $(, $label:expr => $value:expr)*) => {{
        #[cfg(feature = "metrics")]
        counter!($name $(, $label => $value)*).increment(1);
    }};
}

/// Record one fragment transmission.
pub fn inc_fragments_sent() { increment!(FRAGMENTS_SENT); }

/// Record one retransmission.
pub fn inc_retransmissions() { increment!(RETRANSMISSIONS); }

/// Record one suppressed duplicate.
pub fn inc_duplicates() { increment!(DUPLICATES); }

/// Record one fragment abandoned at the attempt ceiling.
pub fn inc_unconfirmed() { increment!(UNCONFIRMED); }

/// Record one discarded datagram.
pub fn inc_malformed() { increment!(MALFORMED); }

/// Record one complete message in `direction`.
pub fn inc_messages(direction: Direction) {
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
    increment!(MESSAGES, "direction" => direction.as_str());
}
