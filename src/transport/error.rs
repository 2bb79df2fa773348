//! Error types surfaced by the reliable transport.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Failures reported by [`ReliableTransport`](super::ReliableTransport).
///
/// Transient datagram errors and malformed frames never appear here; the
/// engine absorbs them by retrying.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An endpoint address could not be resolved.
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        /// Address as supplied by the caller.
        address: String,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },
    /// The local socket could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Resolved local address.
        address: SocketAddr,
        /// Operating system failure.
        #[source]
        source: io::Error,
    },
    /// A fragment was never acknowledged within the attempt ceiling.
    ///
    /// The message was only partially delivered; fragments after `sequence`
    /// were not sent.
    #[error("fragment {sequence} not acknowledged after {attempts} attempts")]
    Unconfirmed {
        /// Sequence number of the abandoned fragment.
        sequence: u64,
        /// Transmissions made.
        attempts: u32,
    },
    /// The datagram endpoint has been closed.
    #[error("datagram endpoint is closed")]
    Closed,
    /// Any other I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<TransportError> for io::Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(inner) => inner,
            TransportError::Unconfirmed { .. } => io::Error::new(io::ErrorKind::TimedOut, err),
            TransportError::Closed => io::Error::new(io::ErrorKind::NotConnected, err),
            TransportError::Resolve { .. } | TransportError::Bind { .. } => io::Error::other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rstest::rstest;

    use super::TransportError;

    #[rstest]
    #[case(TransportError::Unconfirmed { sequence: 3, attempts: 180 }, io::ErrorKind::TimedOut)]
    #[case(TransportError::Closed, io::ErrorKind::NotConnected)]
    #[case(
        TransportError::Io(io::Error::from(io::ErrorKind::PermissionDenied)),
        io::ErrorKind::PermissionDenied
    )]
    fn maps_onto_io_error_kinds(#[case] err: TransportError, #[case] kind: io::ErrorKind) {
        assert_eq!(io::Error::from(err).kind(), kind);
    }

    #[test]
    fn unconfirmed_names_the_fragment() {
        let err = TransportError::Unconfirmed {
            sequence: 5,
            attempts: 180,
        };
        assert_eq!(
            err.to_string(),
            "fragment 5 not acknowledged after 180 attempts"
        );
    }
}
