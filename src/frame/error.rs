//! Errors raised while decoding datagrams into packets.

use thiserror::Error;

/// A received datagram that does not form a valid [`Packet`](super::Packet).
///
/// Every variant is recoverable: the transport discards the datagram and
/// waits for the next one.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the fixed header were received.
    #[error("incomplete packet header: have {have}, need {need}")]
    IncompleteHeader {
        /// Bytes available.
        have: usize,
        /// Bytes required for a complete header.
        need: usize,
    },
    /// The header advertises more payload than the datagram carries.
    #[error("truncated payload: header declares {declared} bytes, {available} available")]
    TruncatedPayload {
        /// Payload length declared by the header.
        declared: u64,
        /// Payload bytes actually present.
        available: usize,
    },
    /// The `last` flag byte held something other than `0` or `1`.
    #[error("invalid last-fragment flag {0:#04x}")]
    InvalidLastFlag(u8),
}
