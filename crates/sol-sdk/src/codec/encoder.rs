use crate::codec::compact_u16::write_compact_u16;
use crate::codec::Encode;
use crate::error::CodecError;

/// Append-only little-endian writer.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Low 64 bits first, then high 64 bits.
    pub fn write_u128(&mut self, v: u128) {
        self.write_u64(v as u64);
        self.write_u64((v >> 64) as u64);
    }

    pub fn write_i128(&mut self, v: i128) {
        self.write_u128(v as u128);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    /// Raw bytes with no length prefix.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_compact_u16(&mut self, v: u16) {
        write_compact_u16(&mut self.buf, v);
    }

    /// Writes `len` as a compact-u16, failing if it does not fit.
    pub fn write_compact_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = u16::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.write_compact_u16(len);
        Ok(())
    }

    /// Compact-u16 length followed by the bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_compact_len(bytes.len())?;
        self.write_fixed(bytes);
        Ok(())
    }

    /// u64 little-endian byte length followed by UTF-8.
    pub fn write_string(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_fixed(s.as_bytes());
    }

    /// `0x00` for `None`, `0x01` then the body for `Some`.
    pub fn write_option<T: Encode>(&mut self, v: Option<&T>) -> Result<(), CodecError> {
        match v {
            None => {
                self.write_u8(0);
                Ok(())
            }
            Some(inner) => {
                self.write_u8(1);
                inner.encode(self)
            }
        }
    }

    /// Compact-u16 element count followed by each element.
    pub fn write_compact_vec<T: Encode>(&mut self, items: &[T]) -> Result<(), CodecError> {
        self.write_compact_len(items.len())?;
        for item in items {
            item.encode(self)?;
        }
        Ok(())
    }

    pub fn write<T: Encode + ?Sized>(&mut self, v: &T) -> Result<(), CodecError> {
        v.encode(self)
    }
}
