//! Wire messages.
//!
//! The legacy and v0 layouts share one byte stream: a v0 message starts
//! with `0x80 | version`, while the first byte of a legacy message is its
//! signer count, which is always below `0x80`.

mod compiled_keys;
pub mod legacy;
pub mod v0;

use serde::{Deserialize, Serialize};

use crate::address::Pubkey;
use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::error::{CodecError, ValidationError};
use crate::hash::Hash;
use crate::instruction::Instruction;

/// High bit of the first byte marks a versioned message.
pub const MESSAGE_VERSION_PREFIX: u8 = 0x80;

/// Largest signer count a legacy header can hold without looking versioned.
pub const MAX_LEGACY_SIGNERS: u8 = MESSAGE_VERSION_PREFIX - 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

impl Encode for MessageHeader {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_u8(self.num_required_signatures);
        enc.write_u8(self.num_readonly_signed_accounts);
        enc.write_u8(self.num_readonly_unsigned_accounts);
        Ok(())
    }
}

impl Decode for MessageHeader {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            num_required_signatures: dec.read_u8()?,
            num_readonly_signed_accounts: dec.read_u8()?,
            num_readonly_unsigned_accounts: dec.read_u8()?,
        })
    }
}

/// An instruction with its keys replaced by account-table indexes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

impl Encode for CompiledInstruction {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write_u8(self.program_id_index);
        enc.write_bytes(&self.accounts)?;
        enc.write_bytes(&self.data)
    }
}

impl Decode for CompiledInstruction {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            program_id_index: dec.read_u8()?,
            accounts: dec.read_bytes()?.to_vec(),
            data: dec.read_bytes()?.to_vec(),
        })
    }
}

/// A reference into an on-chain address lookup table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

impl Encode for MessageAddressTableLookup {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write(&self.account_key)?;
        enc.write_bytes(&self.writable_indexes)?;
        enc.write_bytes(&self.readonly_indexes)
    }
}

impl Decode for MessageAddressTableLookup {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            account_key: dec.read()?,
            writable_indexes: dec.read_bytes()?.to_vec(),
            readonly_indexes: dec.read_bytes()?.to_vec(),
        })
    }
}

/// A caller-supplied copy of a lookup table's contents, trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLookupTableAccount {
    pub key: Pubkey,
    pub addresses: Vec<Pubkey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVersion {
    Legacy,
    V0,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedMessage {
    Legacy(legacy::Message),
    V0(v0::Message),
}

impl VersionedMessage {
    /// Compiles `instructions`, folding eligible accounts into `lookup_tables`.
    /// The result is v0 only if at least one table was actually used. A
    /// legacy result with more than [`MAX_LEGACY_SIGNERS`] signers is
    /// refused; use [`VersionedMessage::compile_v0`] for those.
    pub fn compile(
        payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: Hash,
        lookup_tables: &[AddressLookupTableAccount],
    ) -> Result<Self, ValidationError> {
        let message = v0::Message::try_compile(payer, instructions, lookup_tables, recent_blockhash)?;
        if message.address_table_lookups.is_empty() {
            check_legacy_signers(&message.header)?;
            Ok(Self::Legacy(legacy::Message {
                header: message.header,
                account_keys: message.account_keys,
                recent_blockhash: message.recent_blockhash,
                instructions: message.instructions,
            }))
        } else {
            Ok(Self::V0(message))
        }
    }

    /// Like [`VersionedMessage::compile`] but always produces v0.
    pub fn compile_v0(
        payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: Hash,
        lookup_tables: &[AddressLookupTableAccount],
    ) -> Result<Self, ValidationError> {
        v0::Message::try_compile(payer, instructions, lookup_tables, recent_blockhash).map(Self::V0)
    }

    pub fn version(&self) -> MessageVersion {
        match self {
            Self::Legacy(_) => MessageVersion::Legacy,
            Self::V0(_) => MessageVersion::V0,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::Legacy(m) => &m.header,
            Self::V0(m) => &m.header,
        }
    }

    pub fn static_account_keys(&self) -> &[Pubkey] {
        match self {
            Self::Legacy(m) => &m.account_keys,
            Self::V0(m) => &m.account_keys,
        }
    }

    pub fn recent_blockhash(&self) -> &Hash {
        match self {
            Self::Legacy(m) => &m.recent_blockhash,
            Self::V0(m) => &m.recent_blockhash,
        }
    }

    pub fn set_recent_blockhash(&mut self, blockhash: Hash) {
        match self {
            Self::Legacy(m) => m.recent_blockhash = blockhash,
            Self::V0(m) => m.recent_blockhash = blockhash,
        }
    }

    pub fn instructions(&self) -> &[CompiledInstruction] {
        match self {
            Self::Legacy(m) => &m.instructions,
            Self::V0(m) => &m.instructions,
        }
    }

    pub fn address_table_lookups(&self) -> Option<&[MessageAddressTableLookup]> {
        match self {
            Self::Legacy(_) => None,
            Self::V0(m) => Some(&m.address_table_lookups),
        }
    }

    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header().num_required_signatures)
    }

    /// Writability as far as the message alone can tell; loaded addresses
    /// are judged by which half of their table lookup they came from.
    pub fn is_maybe_writable(&self, index: usize) -> bool {
        match self {
            Self::Legacy(m) => m.is_writable(index),
            Self::V0(m) => m.is_maybe_writable(index),
        }
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.static_account_keys().first()
    }

    /// Bytes the signatures are computed over.
    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        crate::codec::to_bytes(self)
    }

    /// Strict parse of a standalone message.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CodecError> {
        crate::codec::from_bytes(bytes)
    }
}

impl Encode for VersionedMessage {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        match self {
            Self::Legacy(m) => m.encode(enc),
            Self::V0(m) => {
                enc.write_u8(MESSAGE_VERSION_PREFIX);
                m.encode(enc)
            }
        }
    }
}

impl Decode for VersionedMessage {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let first = dec.peek_u8()?;
        if first & MESSAGE_VERSION_PREFIX == 0 {
            return legacy::Message::decode(dec).map(Self::Legacy);
        }
        dec.read_u8()?;
        match first & !MESSAGE_VERSION_PREFIX {
            0 => v0::Message::decode(dec).map(Self::V0),
            other => Err(CodecError::InvalidMessageVersion(other)),
        }
    }
}

impl From<legacy::Message> for VersionedMessage {
    fn from(message: legacy::Message) -> Self {
        Self::Legacy(message)
    }
}

impl From<v0::Message> for VersionedMessage {
    fn from(message: v0::Message) -> Self {
        Self::V0(message)
    }
}

/// Writability of a static key from the header counts alone.
pub(crate) fn is_static_writable(header: &MessageHeader, num_keys: usize, index: usize) -> bool {
    if index >= num_keys {
        return false;
    }
    let num_signed = usize::from(header.num_required_signatures);
    if index < num_signed {
        index < num_signed - usize::from(header.num_readonly_signed_accounts)
    } else {
        let num_unsigned = num_keys - num_signed;
        index - num_signed < num_unsigned.saturating_sub(usize::from(header.num_readonly_unsigned_accounts))
    }
}

pub(crate) fn check_legacy_signers(header: &MessageHeader) -> Result<(), ValidationError> {
    if header.num_required_signatures > MAX_LEGACY_SIGNERS {
        return Err(ValidationError::TooManyLegacySigners(usize::from(
            header.num_required_signatures,
        )));
    }
    Ok(())
}

/// Header consistency checks applied to every decoded message.
pub(crate) fn check_header(header: &MessageHeader, num_keys: usize) -> Result<(), CodecError> {
    let signed = usize::from(header.num_required_signatures);
    if signed == 0 {
        return Err(CodecError::InvalidHeader("no required signatures"));
    }
    if header.num_readonly_signed_accounts >= header.num_required_signatures {
        return Err(CodecError::InvalidHeader("fee payer must be writable"));
    }
    if signed + usize::from(header.num_readonly_unsigned_accounts) > num_keys {
        return Err(CodecError::InvalidHeader("header counts exceed account keys"));
    }
    Ok(())
}

/// Every program id must be a static key and every account index must fall
/// inside the effective account space.
pub(crate) fn check_instruction_indexes(
    instructions: &[CompiledInstruction],
    num_static: usize,
    num_total: usize,
) -> Result<(), CodecError> {
    for ix in instructions {
        let program = usize::from(ix.program_id_index);
        if program >= num_static {
            return Err(CodecError::AccountIndexOutOfBounds {
                index: program,
                len: num_static,
            });
        }
        if let Some(&bad) = ix.accounts.iter().find(|&&i| usize::from(i) >= num_total) {
            return Err(CodecError::AccountIndexOutOfBounds {
                index: usize::from(bad),
                len: num_total,
            });
        }
    }
    Ok(())
}

/// Position of `key` in `keys` as a u8 instruction index.
pub(crate) fn position_of(keys: &[Pubkey], key: &Pubkey) -> Result<u8, ValidationError> {
    let position = keys
        .iter()
        .position(|k| k == key)
        .ok_or(ValidationError::TooManyAccounts)?;
    u8::try_from(position).map_err(|_| ValidationError::TooManyAccounts)
}

pub(crate) fn compile_instructions(
    instructions: &[Instruction],
    account_space: &[Pubkey],
    num_static: usize,
) -> Result<Vec<CompiledInstruction>, ValidationError> {
    let static_keys = &account_space[..num_static];
    instructions
        .iter()
        .map(|ix| {
            let accounts = ix
                .accounts
                .iter()
                .map(|meta| position_of(account_space, &meta.pubkey))
                .collect::<Result<Vec<u8>, _>>()?;
            Ok(CompiledInstruction {
                program_id_index: position_of(static_keys, &ix.program_id)?,
                accounts,
                data: ix.data.clone(),
            })
        })
        .collect()
}
