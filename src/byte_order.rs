//! Helpers for explicit network byte-order conversions.
//!
//! These helpers keep Clippy expectations scoped to the conversion points so
//! the frame codec can stay explicit about wire endianness without repeating
//! lint annotations.

/// Serialise a `u64` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use ackframe::byte_order::write_network_u64;
///
/// assert_eq!(write_network_u64(0x0102), [0, 0, 0, 0, 0, 0, 0x01, 0x02]);
/// ```
#[must_use]
pub fn write_network_u64(value: u64) -> [u8; 8] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u64` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use ackframe::byte_order::read_network_u64;
///
/// assert_eq!(read_network_u64([0, 0, 0, 0, 0, 0, 0x01, 0x02]), 0x0102);
/// ```
#[must_use]
pub fn read_network_u64(bytes: [u8; 8]) -> u64 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u64::from_be_bytes(bytes)
}

/// Read the network-order `u64` starting at `offset`, if `buf` is long enough.
#[must_use]
pub fn read_network_u64_at(buf: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    let field: [u8; 8] = buf.get(offset..end)?.try_into().ok()?;
    Some(read_network_u64(field))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{read_network_u64, read_network_u64_at, write_network_u64};

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(0x1122_3344_5566_7788)]
    #[case(u64::MAX)]
    fn u64_survives_wire_conversion(#[case] value: u64) {
        assert_eq!(read_network_u64(write_network_u64(value)), value);
    }

    #[test]
    fn most_significant_byte_goes_first() {
        assert_eq!(
            write_network_u64(0x1122_3344_5566_7788),
            [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
    }

    #[rstest]
    #[case(&[0, 0, 0, 0, 0, 0, 0, 9, 0xff], 0, Some(9))]
    #[case(&[0xff, 0, 0, 0, 0, 0, 0, 0, 7], 1, Some(7))]
    #[case(&[0, 0, 0, 0, 0, 0, 0, 1], 1, None)]
    #[case(&[], 0, None)]
    #[case(&[0; 8], usize::MAX, None)]
    fn offset_reads_stay_in_bounds(
        #[case] buf: &[u8],
        #[case] offset: usize,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(read_network_u64_at(buf, offset), expected);
    }
}
