use sha2::{Digest, Sha256};

use crate::address::right_aligned;
use crate::error::SolError;
use crate::macros::impl_fixed_bytes;

/// A 32-byte SHA-256 digest; the type of a recent blockhash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 32]);

impl_fixed_bytes!(Hash, 32, 44, |reason: String| SolError::InvalidEncoding {
    what: "hash",
    reason
});

impl Hash {
    /// Right-aligned on short input, truncated on long input.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(right_aligned(bytes))
    }
}

/// SHA-256 over the concatenation of `vals`.
pub fn hashv(vals: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for v in vals {
        hasher.update(v);
    }
    Hash(hasher.finalize().into())
}

pub fn hash(val: &[u8]) -> Hash {
    hashv(&[val])
}
