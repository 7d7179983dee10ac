//! Signing keys.
//!
//! A [`Keypair`] is a 32-byte ed25519 seed plus its public key; the 64-byte
//! `seed ‖ public` form is what keyfiles and base58 secret strings carry.
//! Anything that can produce a signature for a fixed pubkey implements
//! [`Signer`], which is all the transaction signer needs.

use std::path::Path;

use crypto_utils::{random_seed, ZeroizingBytes, ZeroizingString};
use ed25519_dalek::{Signer as _, SigningKey};
use zeroize::Zeroizing;

use crate::address::Pubkey;
use crate::error::SolError;
use crate::signature::Signature;

pub const KEYPAIR_LENGTH: usize = 64;
pub const SEED_LENGTH: usize = 32;

/// Produces signatures on behalf of one account.
pub trait Signer {
    fn pubkey(&self) -> Pubkey;

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SolError>;
}

pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Fresh keypair from OS randomness.
    pub fn new() -> Result<Self, SolError> {
        let seed = random_seed()?;
        Ok(Self::from_seed_array(&seed))
    }

    pub fn from_seed(seed: &[u8]) -> Result<Self, SolError> {
        let seed: Zeroizing<[u8; SEED_LENGTH]> =
            Zeroizing::new(seed.try_into().map_err(|_| {
                SolError::InvalidPrivateKey(format!(
                    "seed must be {SEED_LENGTH} bytes, got {}",
                    seed.len()
                ))
            })?);
        Ok(Self::from_seed_array(&seed))
    }

    fn from_seed_array(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parses the 64-byte `seed ‖ public` form, rejecting a public half that
    /// does not belong to the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        let secret = ZeroizingBytes::from(bytes);
        let full = secret
            .to_array::<KEYPAIR_LENGTH>()
            .map_err(|e| SolError::InvalidPrivateKey(e.to_string()))?;
        let signing_key = SigningKey::from_keypair_bytes(&full)
            .map_err(|_| SolError::InvalidPrivateKey("public half does not match seed".into()))?;
        Ok(Self { signing_key })
    }

    /// The 64-byte `seed ‖ public` form, wiped when dropped.
    pub fn to_bytes(&self) -> ZeroizingBytes {
        ZeroizingBytes::new(self.signing_key.to_keypair_bytes().to_vec())
    }

    pub fn from_base58_string(s: &str) -> Result<Self, SolError> {
        let bytes = Zeroizing::new(
            bs58::decode(s)
                .into_vec()
                .map_err(|e| SolError::InvalidPrivateKey(format!("bad base58: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn to_base58_string(&self) -> ZeroizingString {
        ZeroizingString::new(bs58::encode(&*self.to_bytes()).into_string())
    }

    /// Parses a keyfile: a JSON array of 64 integers.
    pub fn from_json(json: &str) -> Result<Self, SolError> {
        let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
            serde_json::from_str(json)
                .map_err(|e| SolError::InvalidPrivateKey(format!("bad keyfile: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn to_json(&self) -> ZeroizingString {
        let bytes = self.to_bytes();
        let items: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
        ZeroizingString::new(format!("[{}]", items.join(",")))
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, SolError> {
        let path = path.as_ref();
        let contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            SolError::InvalidPrivateKey(format!("cannot read {}: {e}", path.display()))
        })?);
        Self::from_json(&contents)
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::from(self.signing_key.verifying_key().to_bytes())
    }

    /// Signs `message`. Infallible for an in-memory key.
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message))
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Pubkey {
        Keypair::pubkey(self)
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SolError> {
        Ok(self.sign_message(message))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair({})", self.pubkey())
    }
}

/// A signature produced elsewhere (hardware wallet, remote signer) bound to
/// its public key. It only "signs" the message it was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presigner {
    pubkey: Pubkey,
    signature: Signature,
}

impl Presigner {
    pub fn new(pubkey: Pubkey, signature: Signature) -> Self {
        Self { pubkey, signature }
    }
}

impl Signer for Presigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SolError> {
        if !self.pubkey.is_on_curve() {
            return Err(SolError::InvalidPublicKey(format!(
                "{} is not an ed25519 point",
                self.pubkey
            )));
        }
        if self.signature.verify(&self.pubkey, message) {
            Ok(self.signature)
        } else {
            Err(SolError::SigningError(format!(
                "presigned signature for {} does not match message",
                self.pubkey
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keypair bytes from the reference sample transaction.
    const SAMPLE_KEYPAIR: [u8; 64] = [
        255, 101, 36, 24, 124, 23, 167, 21, 132, 204, 155, 5, 185, 58, 121, 75, 156, 227, 116,
        193, 215, 38, 142, 22, 8, 14, 229, 239, 119, 93, 5, 218, 36, 100, 158, 252, 33, 161, 97,
        185, 62, 89, 99, 195, 250, 249, 187, 189, 171, 118, 241, 90, 248, 14, 68, 219, 231, 62,
        157, 5, 142, 27, 210, 117,
    ];

    #[test]
    fn from_bytes_derives_matching_pubkey() {
        let kp = Keypair::from_bytes(&SAMPLE_KEYPAIR).unwrap();
        assert_eq!(kp.pubkey().to_bytes()[..], SAMPLE_KEYPAIR[32..]);
        assert_eq!(&*kp.to_bytes(), &SAMPLE_KEYPAIR[..]);
    }

    #[test]
    fn from_bytes_rejects_mismatched_public_half() {
        let mut bytes = SAMPLE_KEYPAIR;
        bytes[40] ^= 0xff;
        assert!(matches!(
            Keypair::from_bytes(&bytes),
            Err(SolError::InvalidPrivateKey(_))
        ));
        assert!(Keypair::from_bytes(&SAMPLE_KEYPAIR[..63]).is_err());
    }

    #[test]
    fn seed_and_full_forms_agree() {
        let a = Keypair::from_seed(&SAMPLE_KEYPAIR[..32]).unwrap();
        let b = Keypair::from_bytes(&SAMPLE_KEYPAIR).unwrap();
        assert_eq!(a.pubkey(), b.pubkey());
        assert!(Keypair::from_seed(&[1u8; 31]).is_err());
    }

    #[test]
    fn base58_and_json_round_trip() {
        let kp = Keypair::new().unwrap();

        let text = kp.to_base58_string();
        assert_eq!(Keypair::from_base58_string(&text).unwrap().pubkey(), kp.pubkey());

        let json = kp.to_json();
        assert!(json.starts_with('['));
        assert_eq!(Keypair::from_json(&json).unwrap().pubkey(), kp.pubkey());
    }

    #[test]
    fn keyfile_rejects_garbage() {
        assert!(Keypair::from_json("not json").is_err());
        assert!(Keypair::from_json("[1,2,3]").is_err());
        assert!(Keypair::from_json("[256]").is_err());
    }

    #[test]
    fn read_from_file_loads_keyfile() {
        let kp = Keypair::from_bytes(&SAMPLE_KEYPAIR).unwrap();
        let path = std::env::temp_dir().join(format!("sol-sdk-keypair-{}.json", kp.pubkey()));
        std::fs::write(&path, &*kp.to_json()).unwrap();
        let loaded = Keypair::read_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.pubkey(), kp.pubkey());
    }

    #[test]
    fn signatures_verify() {
        let kp = Keypair::new().unwrap();
        let sig = kp.sign_message(b"payload");
        assert!(sig.verify(&kp.pubkey(), b"payload"));
        assert_eq!(kp.try_sign_message(b"payload").unwrap(), sig);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_bytes(&SAMPLE_KEYPAIR).unwrap();
        let dbg = format!("{kp:?}");
        assert_eq!(dbg, format!("Keypair({})", kp.pubkey()));
    }

    #[test]
    fn presigner_only_signs_its_message() {
        let kp = Keypair::new().unwrap();
        let sig = kp.sign_message(b"the message");
        let presigner = Presigner::new(kp.pubkey(), sig);
        assert_eq!(presigner.try_sign_message(b"the message").unwrap(), sig);
        assert!(presigner.try_sign_message(b"another").is_err());
    }

    #[test]
    fn presigner_for_off_curve_key_is_rejected() {
        let (pda, _) =
            crate::pda::find_program_address(&[b"vault".as_slice()], &Pubkey::new_unique()).unwrap();
        let presigner = Presigner::new(pda, Signature::default());
        let err = presigner.try_sign_message(b"anything").unwrap_err();
        assert!(matches!(err, SolError::InvalidPublicKey(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Crypto);
    }
}
