//! Binary codec for the wire format and for program instruction payloads.
//!
//! All integers are little-endian; 128-bit integers are written as
//! `(lo: u64, hi: u64)`. Variable-length byte arrays carry a compact-u16
//! length, strings a u64 length. Instruction enums lead with a
//! [`Discriminator`] whose width and byte order each program fixes.

pub mod compact_u16;
mod decoder;
mod encoder;

pub use compact_u16::{decode_compact_u16, encode_compact_u16, write_compact_u16};
pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::address::Pubkey;
use crate::error::CodecError;
use crate::hash::Hash;
use crate::signature::Signature;

pub trait Encode {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError>;
}

pub trait Decode: Sized {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError>;
}

pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_inner())
}

/// Strict decode: the whole buffer must be consumed.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut dec = Decoder::new(bytes);
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

macro_rules! impl_int_codec {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
                    enc.$write(*self);
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
                    dec.$read()
                }
            }
        )*
    };
}

impl_int_codec! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    u128 => write_u128, read_u128;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    i128 => write_i128, read_i128;
    bool => write_bool, read_bool;
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_string(self);
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_string(self);
        Ok(())
    }
}

impl Decode for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.read_string()
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_fixed(self);
        Ok(())
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.read_array()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_option(self.as_ref())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        dec.read_option()
    }
}

macro_rules! impl_fixed_codec {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
                    enc.write_fixed(self.as_ref());
                    Ok(())
                }
            }

            impl Decode for $ty {
                fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
                    Ok(Self::new_from_array(dec.read_array()?))
                }
            }
        )*
    };
}

impl_fixed_codec!(Pubkey, Hash, Signature);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Layout of the leading variant tag of a program instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discriminator {
    width: usize,
    endian: Endian,
}

impl Discriminator {
    pub const U8: Self = Self::new(1, Endian::Little);
    pub const U16_LE: Self = Self::new(2, Endian::Little);
    pub const U32_LE: Self = Self::new(4, Endian::Little);
    pub const U64_LE: Self = Self::new(8, Endian::Little);
    pub const U16_BE: Self = Self::new(2, Endian::Big);
    pub const U32_BE: Self = Self::new(4, Endian::Big);
    pub const U64_BE: Self = Self::new(8, Endian::Big);

    const fn new(width: usize, endian: Endian) -> Self {
        Self { width, endian }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn write(&self, enc: &mut Encoder, value: u64) -> Result<(), CodecError> {
        if self.width < 8 && value >> (self.width * 8) != 0 {
            return Err(CodecError::DiscriminatorOverflow {
                value,
                width: self.width,
            });
        }
        match self.endian {
            Endian::Little => enc.write_fixed(&value.to_le_bytes()[..self.width]),
            Endian::Big => enc.write_fixed(&value.to_be_bytes()[8 - self.width..]),
        }
        Ok(())
    }

    pub fn read(&self, dec: &mut Decoder<'_>) -> Result<u64, CodecError> {
        let raw = dec.read_slice(self.width)?;
        let mut buf = [0u8; 8];
        Ok(match self.endian {
            Endian::Little => {
                buf[..self.width].copy_from_slice(raw);
                u64::from_le_bytes(buf)
            }
            Endian::Big => {
                buf[8 - self.width..].copy_from_slice(raw);
                u64::from_be_bytes(buf)
            }
        })
    }
}
