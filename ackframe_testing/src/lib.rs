//! Test doubles and fixtures for exercising `ackframe` transports.
//!
//! [`LossyChannel`] is an in-memory [`Datagram`](ackframe::Datagram) whose
//! fault filter decides, per transmitted datagram, whether it is delivered,
//! dropped or duplicated. [`loopback_pair`] returns two real UDP endpoints
//! aimed at each other on `127.0.0.1`.
//!
//! ```rust
//! use ackframe::ReliableTransport;
//! use ackframe_testing::LossyChannel;
//!
//! # async fn example() {
//! let (a, b) = LossyChannel::pair();
//! let mut sender = ReliableTransport::new(a);
//! let mut receiver = ReliableTransport::new(b);
//! let (sent, received) = tokio::join!(sender.send(b"hi"), receiver.recv(0));
//! assert_eq!(sent.unwrap(), 2);
//! assert_eq!(&received.unwrap()[..], b"hi");
//! # }
//! ```

pub mod channel;
pub mod logging;
pub mod loopback;

pub use channel::{Fate, LossyChannel, TransmissionLog};
pub use logging::{LogCapture, log_capture};
pub use loopback::loopback_pair;
