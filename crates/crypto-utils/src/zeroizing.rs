use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

/// Secret bytes (seeds, 64-byte keypair material) wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingBytes(Vec<u8>);

impl ZeroizingBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies the contents into a fixed-size array that is itself wiped on
    /// drop. Fails unless the length is exactly `N`.
    pub fn to_array<const N: usize>(&self) -> Result<Zeroizing<[u8; N]>, CryptoError> {
        if self.0.len() != N {
            return Err(CryptoError::InvalidKeyLength {
                expected: N,
                actual: self.0.len(),
            });
        }
        let mut out = Zeroizing::new([0u8; N]);
        out.copy_from_slice(&self.0);
        Ok(out)
    }
}

impl Deref for ZeroizingBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ZeroizingBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ZeroizingBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl std::fmt::Debug for ZeroizingBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ZeroizingBytes([REDACTED; {}])", self.0.len())
    }
}

/// Secret text (base58 secret keys, keyfile JSON) wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingString(String);

impl ZeroizingString {
    pub fn new(data: String) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for ZeroizingString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ZeroizingString {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&str> for ZeroizingString {
    fn from(data: &str) -> Self {
        Self::new(data.to_owned())
    }
}

impl std::fmt::Debug for ZeroizingString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ZeroizingString([REDACTED])")
    }
}
