//! Wire format for reliable-transport fragments.
//!
//! Every datagram exchanged between peers is one [`Packet`]: a fixed
//! [`HEADER_SIZE`]-byte header followed by `size` payload bytes. All integers
//! are big-endian.
//!
//! ```text
//!  offset  size  field
//!  0       8     sequence   fragment sequence number (0 on pure acks)
//!  8       8     ack        cumulative count of fragments accepted
//!  16      8     size       payload length in bytes
//!  24      1     last       1 on the final fragment of a message, else 0
//!  25      size  payload
//! ```
//!
//! No I/O happens here; encoding and decoding are pure transformations and
//! decoding never reads past the supplied buffer.

pub mod error;

use bytes::{BufMut, Bytes, BytesMut};
pub use error::FrameError;

use crate::byte_order::{read_network_u64_at, write_network_u64};

/// Byte length of the fixed header preceding every payload.
pub const HEADER_SIZE: usize = 25;

const OFF_SEQUENCE: usize = 0;
const OFF_ACK: usize = 8;
const OFF_SIZE: usize = 16;
const OFF_LAST: usize = 24;

/// Fixed-size header fields of a [`Packet`].
///
/// The send loop only needs the acknowledgement carried by a response, so the
/// header can be decoded on its own without validating the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PacketHeader {
    /// Sequence number of the fragment; zero on pure acknowledgements.
    pub sequence: u64,
    /// Number of fragments the sender has accepted from its peer.
    pub ack: u64,
    /// Declared payload length in bytes.
    pub size: u64,
    /// Whether this fragment ends the current message.
    pub last: bool,
}

impl PacketHeader {
    /// Decode the leading [`HEADER_SIZE`] bytes of `buf`.
    ///
    /// Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IncompleteHeader`] when `buf` is shorter than the
    /// header, or [`FrameError::InvalidLastFlag`] when the flag byte is neither
    /// `0` nor `1`.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        let incomplete = || FrameError::IncompleteHeader {
            have: buf.len(),
            need: HEADER_SIZE,
        };
        let (Some(sequence), Some(ack), Some(size), Some(&flag)) = (
            read_network_u64_at(buf, OFF_SEQUENCE),
            read_network_u64_at(buf, OFF_ACK),
            read_network_u64_at(buf, OFF_SIZE),
            buf.get(OFF_LAST),
        ) else {
            return Err(incomplete());
        };
        let last = match flag {
            0 => false,
            1 => true,
            other => return Err(FrameError::InvalidLastFlag(other)),
        };
        Ok(Self {
            sequence,
            ack,
            size,
            last,
        })
    }

    fn encode_into(&self, dst: &mut BytesMut) {
        dst.put_slice(&write_network_u64(self.sequence));
        dst.put_slice(&write_network_u64(self.ack));
        dst.put_slice(&write_network_u64(self.size));
        dst.put_u8(u8::from(self.last));
    }
}

/// A complete protocol datagram: header plus payload.
///
/// The `size` header field is always derived from the payload, so
/// `payload.len() == size` holds for every constructed packet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    header: PacketHeader,
    payload: Bytes,
}

impl Packet {
    /// Build a data fragment.
    #[must_use]
    pub fn fragment(sequence: u64, ack: u64, payload: Bytes, last: bool) -> Self {
        Self {
            header: PacketHeader {
                sequence,
                ack,
                size: payload.len() as u64,
                last,
            },
            payload,
        }
    }

    /// Build a pure acknowledgement carrying only `ack`.
    #[must_use]
    pub fn acknowledgement(ack: u64) -> Self { Self::fragment(0, ack, Bytes::new(), false) }

    /// Return the header fields.
    #[must_use]
    pub const fn header(&self) -> &PacketHeader { &self.header }

    /// Fragment sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u64 { self.header.sequence }

    /// Acknowledgement value carried by this packet.
    #[must_use]
    pub const fn ack(&self) -> u64 { self.header.ack }

    /// Whether this fragment ends its message.
    #[must_use]
    pub const fn is_last(&self) -> bool { self.header.last }

    /// Borrow the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the packet, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Number of bytes [`encode`](Self::encode) will produce.
    #[must_use]
    pub fn encoded_len(&self) -> usize { HEADER_SIZE + self.payload.len() }

    /// Serialise the packet into a new buffer.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut dst);
        dst.freeze()
    }

    /// Append the serialised packet to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        self.header.encode_into(dst);
        dst.put_slice(&self.payload);
    }

    /// Parse a packet from a received datagram.
    ///
    /// Exactly `size` payload bytes are taken after the header; any trailing
    /// bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the header is incomplete or invalid, or
    /// when fewer than `size` payload bytes follow it.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        let header = PacketHeader::decode(buf)?;
        let available = buf.len() - HEADER_SIZE;
        let truncated = FrameError::TruncatedPayload {
            declared: header.size,
            available,
        };
        let size = usize::try_from(header.size).map_err(|_| truncated)?;
        let payload = HEADER_SIZE
            .checked_add(size)
            .and_then(|end| buf.get(HEADER_SIZE..end))
            .ok_or(truncated)?;
        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}
