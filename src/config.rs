//! Transport configuration.
//!
//! [`TransportConfig`] carries the fixed retransmission policy of the
//! stop-and-wait engine. The defaults are tuned for loopback and LAN links and
//! are not adapted at runtime.

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use crate::frame::HEADER_SIZE;

/// Maximum payload bytes carried by one fragment.
pub const FRAGMENT_SIZE: usize = 512;

/// Time to wait for a single datagram before an attempt counts as failed.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(3);

/// Transmissions of one fragment before the sender gives up on it.
pub const MAX_ATTEMPTS: u32 = 180;

/// Retransmission and fragmentation policy for one
/// [`ReliableTransport`](crate::transport::ReliableTransport).
///
/// Both peers of a connection must agree on `fragment_size`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use ackframe::TransportConfig;
///
/// let config = TransportConfig::default().receive_timeout(Duration::from_millis(10));
/// assert_eq!(config.max_datagram_size(), 512 + 25);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    fragment_size: NonZeroUsize,
    receive_timeout: Duration,
    max_attempts: NonZeroU32,
}

impl TransportConfig {
    /// Largest payload placed in one fragment.
    #[must_use]
    pub const fn get_fragment_size(&self) -> NonZeroUsize { self.fragment_size }

    /// Per-attempt receive timeout.
    #[must_use]
    pub const fn get_receive_timeout(&self) -> Duration { self.receive_timeout }

    /// Attempt ceiling per fragment.
    #[must_use]
    pub const fn get_max_attempts(&self) -> NonZeroU32 { self.max_attempts }

    /// Largest datagram a peer using this configuration will send.
    #[must_use]
    pub const fn max_datagram_size(&self) -> usize { self.fragment_size.get() + HEADER_SIZE }

    /// Set the largest payload placed in one fragment.
    #[must_use]
    pub fn fragment_size(mut self, size: NonZeroUsize) -> Self {
        self.fragment_size = size;
        self
    }

    /// Set the per-attempt receive timeout.
    ///
    /// A zero duration is raised to one millisecond so every attempt still
    /// waits for the peer.
    #[must_use]
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    /// Set how many times a fragment is transmitted before it is reported as
    /// unconfirmed.
    #[must_use]
    pub fn max_attempts(mut self, attempts: NonZeroU32) -> Self {
        self.max_attempts = attempts;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            fragment_size: NonZeroUsize::new(FRAGMENT_SIZE).unwrap_or(NonZeroUsize::MIN),
            receive_timeout: RECEIVE_TIMEOUT,
            max_attempts: NonZeroU32::new(MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN),
        }
    }
}
