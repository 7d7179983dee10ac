//! 32-byte account addresses.
//!
//! Addresses are raw ed25519 public keys (or off-curve program-derived
//! digests) shown as base58. Ordering is byte-lexicographic, which the
//! message assembler relies on for deterministic account tables.

use std::sync::atomic::{AtomicU64, Ordering};

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

use crate::error::SolError;
use crate::macros::impl_fixed_bytes;
use crate::pda::{PdaError, MAX_SEED_LEN, PDA_MARKER};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pubkey([u8; 32]);

impl_fixed_bytes!(Pubkey, 32, 44, SolError::InvalidAddress);

impl Pubkey {
    /// Builds a key from an arbitrary slice. Short input is right-aligned
    /// behind leading zeros; long input keeps its first 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(right_aligned(bytes))
    }

    /// A process-unique key. Later keys compare greater than earlier ones.
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Whether these bytes decompress to a point on the ed25519 curve.
    /// Program-derived addresses are exactly the ones that do not.
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }

    /// Derives `sha256(base ‖ seed ‖ owner)`, the address used by
    /// `create_account_with_seed` style flows.
    pub fn create_with_seed(base: &Pubkey, seed: &str, owner: &Pubkey) -> Result<Pubkey, SolError> {
        if seed.len() > MAX_SEED_LEN {
            return Err(PdaError::MaxSeedLengthExceeded.into());
        }
        if owner.0.ends_with(PDA_MARKER) {
            return Err(PdaError::IllegalOwner.into());
        }
        let digest = Sha256::new()
            .chain_update(base.0)
            .chain_update(seed.as_bytes())
            .chain_update(owner.0)
            .finalize();
        Ok(Self(digest.into()))
    }
}

pub(crate) fn right_aligned(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    if bytes.len() >= 32 {
        out.copy_from_slice(&bytes[..32]);
    } else {
        out[32 - bytes.len()..].copy_from_slice(bytes);
    }
    out
}
