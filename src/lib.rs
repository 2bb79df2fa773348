#![doc(html_root_url = "https://docs.rs/ackframe/latest")]
//! Reliable, ordered messaging over UDP.
//!
//! `ackframe` layers a stop-and-wait acknowledgement scheme over an
//! unreliable datagram channel. Messages are split into fixed-size fragments,
//! each carried in a packet with a 25-byte header and retransmitted until the
//! peer acknowledges it. [`ReliableStream`] exposes the transport as a tokio
//! byte stream so a TLS session can run on top of it.

pub mod byte_order;
pub mod config;
pub mod endpoint;
pub mod frame;
pub mod metrics;
pub mod stream;
pub mod tls;
pub mod transport;

pub use config::{FRAGMENT_SIZE, MAX_ATTEMPTS, RECEIVE_TIMEOUT, TransportConfig};
pub use endpoint::{Datagram, UdpEndpoint};
pub use frame::{FrameError, HEADER_SIZE, Packet, PacketHeader};
pub use stream::ReliableStream;
pub use tls::{tls_client, tls_server};
pub use transport::{ReliableTransport, TransportError};
