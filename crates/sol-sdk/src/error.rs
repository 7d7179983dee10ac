use thiserror::Error;

use crate::address::Pubkey;
use crate::pda::PdaError;

/// Bit-level decode or encode failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("{0} trailing bytes after end of value")]
    TrailingBytes(usize),

    #[error("invalid bool byte: {0:#04x}")]
    InvalidBool(u8),

    #[error("invalid option tag: {0:#04x}")]
    InvalidOptionTag(u8),

    #[error("invalid compact-u16 encoding")]
    InvalidCompactU16,

    #[error("length {0} does not fit a compact-u16 prefix")]
    LengthOverflow(usize),

    #[error("string length {0} exceeds the largest addressable buffer")]
    StringLengthOverflow(u64),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("discriminator value {value} does not fit in {width} bytes")]
    DiscriminatorOverflow { value: u64, width: usize },

    #[error("unknown discriminator: {0}")]
    UnknownDiscriminator(u64),

    #[error("unsupported message version: {0}")]
    InvalidMessageVersion(u8),

    #[error("invalid message header: {0}")]
    InvalidHeader(&'static str),

    #[error("account index {index} out of bounds for {len} accounts")]
    AccountIndexOutOfBounds { index: usize, len: usize },
}

/// Violated preconditions in builders, the message assembler, or the signer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("message references more than 256 accounts")]
    TooManyAccounts,

    #[error("legacy messages carry at most 127 signers, found {0}")]
    TooManyLegacySigners(usize),

    #[error("address lookup table index does not fit in a u8")]
    AddressTableIndexOverflow,

    #[error("signature count mismatch: header requires {expected}, found {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },

    #[error("no signer supplied for required account {0}")]
    MissingSigner(Pubkey),

    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("transaction is {size} bytes, limit is {max}")]
    TransactionTooLarge { size: usize, max: usize },

    #[error("transaction is missing one or more signatures")]
    NotFullySigned,
}

/// Coarse error classes used by callers that only need to branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Codec,
    Crypto,
}

/// Errors produced by the local (non-network) half of the SDK.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("program address error: {0}")]
    Pda(#[from] PdaError),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid {what}: {reason}")]
    InvalidEncoding { what: &'static str, reason: String },

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("secret handling failed: {0}")]
    Secret(#[from] crypto_utils::CryptoError),
}

impl SolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Pda(e) => match e {
                PdaError::MaxSeedsExceeded
                | PdaError::MaxSeedLengthExceeded
                | PdaError::IllegalOwner => ErrorKind::Validation,
                PdaError::InvalidSeeds | PdaError::NoViableBumpSeed => ErrorKind::Crypto,
            },
            Self::Codec(_) => ErrorKind::Codec,
            Self::InvalidPrivateKey(_)
            | Self::InvalidPublicKey(_)
            | Self::InvalidAddress(_)
            | Self::InvalidEncoding { .. }
            | Self::SigningError(_)
            | Self::Secret(_) => ErrorKind::Crypto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = SolError::InvalidPrivateKey("key too short".into());
        assert_eq!(err.to_string(), "invalid private key: key too short");
    }

    #[test]
    fn display_missing_fields_lists_every_field() {
        let err = ValidationError::MissingFields(vec!["source", "amount"]);
        assert_eq!(err.to_string(), "missing required fields: source, amount");
    }

    #[test]
    fn display_codec_errors() {
        assert_eq!(
            CodecError::UnexpectedEof {
                needed: 32,
                remaining: 4
            }
            .to_string(),
            "unexpected end of input: needed 32 bytes, 4 remaining"
        );
        assert_eq!(
            CodecError::InvalidBool(2).to_string(),
            "invalid bool byte: 0x02"
        );
    }

    #[test]
    fn from_conversions_pick_the_right_kind() {
        let err: SolError = CodecError::InvalidCompactU16.into();
        assert_eq!(err.kind(), ErrorKind::Codec);

        let err: SolError = ValidationError::TooManyAccounts.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: SolError = PdaError::MaxSeedLengthExceeded.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(SolError::from(PdaError::IllegalOwner).kind(), ErrorKind::Validation);
        assert_eq!(SolError::from(PdaError::InvalidSeeds).kind(), ErrorKind::Crypto);

        let err = SolError::SigningError("bad key".into());
        assert_eq!(err.kind(), ErrorKind::Crypto);
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(SolError::from(ValidationError::NotFullySigned));
        assert!(err.to_string().contains("missing one or more signatures"));
    }
}
