use ed25519_dalek::VerifyingKey;

use crate::address::Pubkey;
use crate::error::SolError;
use crate::macros::impl_fixed_bytes;

/// A detached 64-byte ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature([u8; 64]);

impl_fixed_bytes!(Signature, 64, 88, |reason: String| SolError::InvalidEncoding {
    what: "signature",
    reason
});

impl Signature {
    /// Strict ed25519 verification of `message` under `pubkey`.
    /// Returns false for malformed keys instead of erroring.
    pub fn verify(&self, pubkey: &Pubkey, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(pubkey.as_array()) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify_strict(message, &sig).is_ok()
    }

    /// The placeholder left in slots that partial signing could not fill.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Self(sig.to_bytes())
    }
}
