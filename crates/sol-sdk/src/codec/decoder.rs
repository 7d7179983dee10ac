use crate::codec::compact_u16::decode_compact_u16;
use crate::codec::Decode;
use crate::error::CodecError;

/// Bounds-checked little-endian reader over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, CodecError> {
        self.data.get(self.pos).copied().ok_or(CodecError::UnexpectedEof {
            needed: 1,
            remaining: 0,
        })
    }

    /// Fails with [`CodecError::TrailingBytes`] unless every byte was consumed.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::UnexpectedEof {
                needed: len,
                remaining,
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let slice = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_u128(&mut self) -> Result<u128, CodecError> {
        let lo = self.read_u64()?;
        let hi = self.read_u64()?;
        Ok(u128::from(hi) << 64 | u128::from(lo))
    }

    pub fn read_i128(&mut self) -> Result<i128, CodecError> {
        Ok(self.read_u128()? as i128)
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_compact_u16(&mut self) -> Result<u16, CodecError> {
        let (value, used) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    /// Compact-u16 length followed by that many bytes.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_compact_u16()?;
        self.read_slice(usize::from(len))
    }

    /// u64 length followed by UTF-8 bytes. Lengths no slice could hold
    /// (above `isize::MAX`) are reported as overflow rather than a short read.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let declared = self.read_u64()?;
        let len = usize::try_from(declared)
            .ok()
            .filter(|len| isize::try_from(*len).is_ok())
            .ok_or(CodecError::StringLengthOverflow(declared))?;
        let bytes = self.read_slice(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_option<T: Decode>(&mut self) -> Result<Option<T>, CodecError> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => T::decode(self).map(Some),
            other => Err(CodecError::InvalidOptionTag(other)),
        }
    }

    pub fn read_compact_vec<T: Decode>(&mut self) -> Result<Vec<T>, CodecError> {
        let len = usize::from(self.read_compact_u16()?);
        // Every element is at least one byte; cap the reservation by what is left.
        let mut out = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            out.push(T::decode(self)?);
        }
        Ok(out)
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, CodecError> {
        T::decode(self)
    }
}
