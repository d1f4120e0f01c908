//! Stateless readers over a byte buffer.
//!
//! Every reader takes the buffer and an absolute offset and returns the decoded
//! value together with the offset just past it, so callers thread the position
//! through explicitly.

use super::error::{ParseError, Result};

/// Largest value a four-byte variable-length quantity can carry.
pub const MAX_VARIABLE_LENGTH: u32 = 0x0FFF_FFFF;

/// Decodes a MIDI variable-length quantity starting at `offset`.
///
/// Seven bits are taken from each byte, most significant group first, until a
/// byte with the high bit clear terminates the value.
pub fn read_variable_length(buffer: &[u8], offset: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut position = offset;

    loop {
        let byte = *buffer
            .get(position)
            .ok_or(ParseError::TruncatedInput { offset: position })?;
        position += 1;

        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, position));
        }
    }
}

/// Reads `width` bytes at `offset` as a big-endian unsigned integer.
pub fn read_fixed_be(buffer: &[u8], offset: usize, width: usize) -> Result<(u32, usize)> {
    debug_assert!(width <= 4, "fixed-width reads are at most four bytes");

    let end = offset
        .checked_add(width)
        .filter(|end| *end <= buffer.len())
        .ok_or(ParseError::TruncatedInput {
            offset: buffer.len(),
        })?;

    let value = buffer[offset..end]
        .iter()
        .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
    Ok((value, end))
}

/// Reads a single byte at `offset`.
pub fn read_u8(buffer: &[u8], offset: usize) -> Result<(u8, usize)> {
    buffer
        .get(offset)
        .map(|byte| (*byte, offset + 1))
        .ok_or(ParseError::TruncatedInput { offset })
}

/// Encodes `value` as a variable-length quantity.
///
/// Values above [`MAX_VARIABLE_LENGTH`] do not fit the four bytes the file
/// format allows; they are still encoded, using five bytes.
pub fn encode_variable_length(value: u32) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push(0x80 | (rest & 0x7F) as u8);
        rest >>= 7;
    }
    groups.reverse();
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_quantity() {
        assert_eq!(read_variable_length(&[0x00], 0).unwrap(), (0, 1));
        assert_eq!(read_variable_length(&[0x7F], 0).unwrap(), (0x7F, 1));
    }

    #[test]
    fn test_multi_byte_quantities_from_file_format_table() {
        let cases: [(&[u8], u32); 6] = [
            (&[0x81, 0x00], 0x80),
            (&[0xC0, 0x00], 0x2000),
            (&[0xFF, 0x7F], 0x3FFF),
            (&[0x81, 0x80, 0x00], 0x4000),
            (&[0xFF, 0xFF, 0x7F], 0x1F_FFFF),
            (&[0xFF, 0xFF, 0xFF, 0x7F], MAX_VARIABLE_LENGTH),
        ];

        for (bytes, expected) in cases {
            let (value, next) = read_variable_length(bytes, 0).unwrap();
            assert_eq!(value, expected, "decoding {:02X?}", bytes);
            assert_eq!(next, bytes.len());
        }
    }

    #[test]
    fn test_quantity_at_offset() {
        let buffer = [0xAA, 0xBB, 0x83, 0x60, 0x01];
        assert_eq!(read_variable_length(&buffer, 2).unwrap(), (480, 4));
    }

    #[test]
    fn test_unterminated_quantity_is_truncated() {
        let err = read_variable_length(&[0x81, 0x80], 0).unwrap_err();
        assert_eq!(err, ParseError::TruncatedInput { offset: 2 });
    }

    #[test]
    fn test_encode_matches_decode_at_group_boundaries() {
        for value in [0, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, MAX_VARIABLE_LENGTH] {
            let encoded = encode_variable_length(value);
            assert!(encoded.len() <= 4);
            assert_eq!(
                read_variable_length(&encoded, 0).unwrap(),
                (value, encoded.len())
            );
        }
    }

    #[test]
    fn test_fixed_width_big_endian() {
        let buffer = [0x00, 0x00, 0x00, 0x06, 0x00, 0x60];
        assert_eq!(read_fixed_be(&buffer, 0, 4).unwrap(), (6, 4));
        assert_eq!(read_fixed_be(&buffer, 4, 2).unwrap(), (96, 6));
    }

    #[test]
    fn test_fixed_width_past_end_is_truncated() {
        let err = read_fixed_be(&[0x00, 0x01], 1, 2).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedInput { .. }));
    }
}
