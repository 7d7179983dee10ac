//! Compact-u16: the 1–3 byte varint used for every array length in the wire
//! format. Seven payload bits per byte, high bit set on all but the last.

use crate::error::CodecError;

pub const MAX_ENCODING_LENGTH: usize = 3;

/// Appends the shortest encoding of `value` to `buf`.
pub fn write_compact_u16(buf: &mut Vec<u8>, value: u16) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_ENCODING_LENGTH);
    write_compact_u16(&mut buf, value);
    buf
}

/// Decodes from the front of `bytes`, returning the value and the number of
/// bytes consumed.
///
/// Rejects encodings longer than three bytes, a third byte with the
/// continuation bit set, values above `u16::MAX`, and non-canonical forms
/// that end in a zero byte after the first.
pub fn decode_compact_u16(bytes: &[u8]) -> Result<(u16, usize), CodecError> {
    let mut value: u32 = 0;
    for nth in 0..MAX_ENCODING_LENGTH {
        let byte = *bytes.get(nth).ok_or(CodecError::UnexpectedEof {
            needed: nth + 1,
            remaining: bytes.len(),
        })?;
        if byte == 0 && nth != 0 {
            return Err(CodecError::InvalidCompactU16);
        }
        value |= u32::from(byte & 0x7f) << (nth * 7);
        if byte & 0x80 == 0 {
            let value = u16::try_from(value).map_err(|_| CodecError::InvalidCompactU16)?;
            return Ok((value, nth + 1));
        }
    }
    Err(CodecError::InvalidCompactU16)
}

/// Encoded size of `value`: ceil(bits / 7), minimum one byte.
pub fn compact_u16_len(value: u16) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_forms() {
        assert_eq!(encode_compact_u16(0), vec![0x00]);
        assert_eq!(encode_compact_u16(127), vec![0x7f]);
        assert_eq!(encode_compact_u16(128), vec![0x80, 0x01]);
        assert_eq!(encode_compact_u16(255), vec![0xff, 0x01]);
        assert_eq!(encode_compact_u16(16383), vec![0xff, 0x7f]);
        assert_eq!(encode_compact_u16(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_compact_u16(65535), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn exhaustive_round_trip() {
        for n in 0..=u16::MAX {
            let enc = encode_compact_u16(n);
            assert_eq!(enc.len(), compact_u16_len(n), "length for {n}");
            let bits = 16 - n.leading_zeros() as usize;
            assert_eq!(enc.len(), bits.div_ceil(7).max(1));
            assert_eq!(decode_compact_u16(&enc).unwrap(), (n, enc.len()));
        }
    }

    #[test]
    fn decode_ignores_trailing_data() {
        assert_eq!(decode_compact_u16(&[0x05, 0xaa, 0xbb]).unwrap(), (5, 1));
        assert_eq!(decode_compact_u16(&[0x80, 0x01, 0xff]).unwrap(), (128, 2));
    }

    #[test]
    fn rejects_four_byte_encoding() {
        assert_eq!(
            decode_compact_u16(&[0x80, 0x80, 0x80, 0x00]),
            Err(CodecError::InvalidCompactU16)
        );
    }

    #[test]
    fn rejects_continuation_on_third_byte() {
        assert_eq!(
            decode_compact_u16(&[0xff, 0xff, 0x83]),
            Err(CodecError::InvalidCompactU16)
        );
    }

    #[test]
    fn rejects_overflow() {
        // 0x04 in the third byte puts bit 16 past u16::MAX
        assert_eq!(
            decode_compact_u16(&[0x80, 0x80, 0x04]),
            Err(CodecError::InvalidCompactU16)
        );
    }

    #[test]
    fn rejects_non_canonical_aliases() {
        assert_eq!(
            decode_compact_u16(&[0x80, 0x00]),
            Err(CodecError::InvalidCompactU16)
        );
        assert_eq!(
            decode_compact_u16(&[0xff, 0x80, 0x00]),
            Err(CodecError::InvalidCompactU16)
        );
    }

    #[test]
    fn short_input() {
        assert!(matches!(
            decode_compact_u16(&[]),
            Err(CodecError::UnexpectedEof { .. })
        ));
        assert!(matches!(
            decode_compact_u16(&[0x80]),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }
}
