//! Signed transactions and their wire format.
//!
//! Wire layout: compact-u16 signature count, the 64-byte signatures in
//! account-key order, then the serialized message. Signatures cover the
//! message bytes only.

use std::collections::BTreeMap;

use base64::Engine as _;

use crate::address::Pubkey;
use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::error::{CodecError, SolError, ValidationError};
use crate::hash::Hash;
use crate::instruction::Instruction;
use crate::keypair::Signer;
use crate::message::{AddressLookupTableAccount, VersionedMessage};
use crate::signature::Signature;

/// Largest serialized transaction the network accepts (one UDP packet).
pub const PACKET_DATA_SIZE: usize = 1232;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: VersionedMessage,
}

impl Transaction {
    /// Wraps a message with every signature slot zeroed.
    pub fn new_unsigned(message: VersionedMessage) -> Self {
        let n = usize::from(message.header().num_required_signatures);
        Self {
            signatures: vec![Signature::default(); n],
            message,
        }
    }

    /// Compiles `instructions` for `payer` and signs with `signers`.
    pub fn new_signed(
        payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: Hash,
        lookup_tables: &[AddressLookupTableAccount],
        signers: &[&dyn Signer],
    ) -> Result<Self, SolError> {
        let message = VersionedMessage::compile(payer, instructions, recent_blockhash, lookup_tables)?;
        let mut tx = Self::new_unsigned(message);
        tx.sign(signers)?;
        Ok(tx)
    }

    pub fn message_data(&self) -> Result<Vec<u8>, CodecError> {
        self.message.serialize()
    }

    /// Fills every required signature slot. Fails, leaving the transaction
    /// untouched, if any required signer is absent from `signers`.
    pub fn sign(&mut self, signers: &[&dyn Signer]) -> Result<(), SolError> {
        self.sign_slots(signers, true)
    }

    /// Signs the slots it has keys for and leaves the others as they are
    /// (zero for never-signed slots).
    pub fn partial_sign(&mut self, signers: &[&dyn Signer]) -> Result<(), SolError> {
        self.sign_slots(signers, false)
    }

    fn sign_slots(&mut self, signers: &[&dyn Signer], require_all: bool) -> Result<(), SolError> {
        let required = usize::from(self.message.header().num_required_signatures);
        let keys = self.message.static_account_keys();
        if keys.len() < required {
            return Err(ValidationError::SignatureCountMismatch {
                expected: required,
                actual: keys.len(),
            }
            .into());
        }

        let lookup: BTreeMap<Pubkey, &dyn Signer> =
            signers.iter().map(|s| (s.pubkey(), *s)).collect();
        let message = self.message_data()?;

        let mut signatures = self.signatures.clone();
        signatures.resize(required, Signature::default());
        for (slot, key) in signatures.iter_mut().zip(&keys[..required]) {
            match lookup.get(key) {
                Some(signer) => *slot = signer.try_sign_message(&message)?,
                None if require_all => return Err(ValidationError::MissingSigner(*key).into()),
                None => {}
            }
        }

        self.signatures = signatures;
        Ok(())
    }

    /// Per-slot verification result, in signer order.
    pub fn verify_with_results(&self) -> Result<Vec<bool>, SolError> {
        let message = self.message_data()?;
        Ok(self
            .signatures
            .iter()
            .zip(self.message.static_account_keys())
            .map(|(sig, key)| sig.verify(key, &message))
            .collect())
    }

    /// Every required slot holds a valid signature for its key.
    pub fn verify(&self) -> Result<(), SolError> {
        let required = usize::from(self.message.header().num_required_signatures);
        if self.signatures.len() != required {
            return Err(ValidationError::SignatureCountMismatch {
                expected: required,
                actual: self.signatures.len(),
            }
            .into());
        }
        if self.verify_with_results()?.into_iter().all(|ok| ok) {
            Ok(())
        } else {
            Err(SolError::SigningError("signature verification failed".into()))
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.iter().all(|s| !s.is_zero())
    }

    /// The fee payer's signature, which doubles as the transaction id.
    pub fn signature(&self) -> Option<&Signature> {
        self.signatures.first()
    }

    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        crate::codec::to_bytes(self)
    }

    /// Strict parse: no trailing bytes, signature count must match the header.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SolError> {
        let tx: Self = crate::codec::from_bytes(bytes)?;
        let required = usize::from(tx.message.header().num_required_signatures);
        if tx.signatures.len() != required {
            return Err(ValidationError::SignatureCountMismatch {
                expected: required,
                actual: tx.signatures.len(),
            }
            .into());
        }
        Ok(tx)
    }

    pub fn to_base58(&self) -> Result<String, CodecError> {
        Ok(bs58::encode(self.serialize()?).into_string())
    }

    pub fn to_base64(&self) -> Result<String, CodecError> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.serialize()?))
    }

    /// Rejects transactions too large to submit.
    pub fn ensure_within_packet_limit(&self) -> Result<usize, SolError> {
        let size = self.serialize()?.len();
        if size > PACKET_DATA_SIZE {
            return Err(ValidationError::TransactionTooLarge {
                size,
                max: PACKET_DATA_SIZE,
            }
            .into());
        }
        Ok(size)
    }
}

impl Encode for Transaction {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_compact_vec(&self.signatures)?;
        enc.write(&self.message)
    }
}

impl Decode for Transaction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            signatures: dec.read_compact_vec()?,
            message: dec.read()?,
        })
    }
}
