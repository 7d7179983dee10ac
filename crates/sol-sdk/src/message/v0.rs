//! Version 0 messages: legacy layout plus address lookup table references.
//!
//! Instruction indexes address the concatenation of the static keys, then
//! every table's writable entries, then every table's readonly entries.

use crate::address::Pubkey;
use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::error::{CodecError, ValidationError};
use crate::hash::Hash;
use crate::instruction::Instruction;
use crate::message::compiled_keys::{CompiledKeys, LoadedAddresses};
use crate::message::{
    check_header, check_instruction_indexes, compile_instructions, is_static_writable,
    AddressLookupTableAccount, CompiledInstruction, MessageAddressTableLookup, MessageHeader,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
}

impl Message {
    pub fn try_compile(
        payer: &Pubkey,
        instructions: &[Instruction],
        address_lookup_table_accounts: &[AddressLookupTableAccount],
        recent_blockhash: Hash,
    ) -> Result<Self, ValidationError> {
        let mut compiled_keys = CompiledKeys::compile(instructions, *payer);

        let mut address_table_lookups = Vec::new();
        let mut loaded = LoadedAddresses::default();
        for table in address_lookup_table_accounts {
            if let Some((lookup, loaded_addresses)) = compiled_keys.try_extract_table_lookup(table)? {
                address_table_lookups.push(lookup);
                loaded.writable.extend(loaded_addresses.writable);
                loaded.readonly.extend(loaded_addresses.readonly);
            }
        }

        let (header, account_keys) = compiled_keys.try_into_message_components()?;

        let num_static = account_keys.len();
        let account_space: Vec<Pubkey> = account_keys
            .iter()
            .chain(&loaded.writable)
            .chain(&loaded.readonly)
            .copied()
            .collect();
        if account_space.len() > usize::from(u8::MAX) + 1 {
            return Err(ValidationError::TooManyAccounts);
        }
        let instructions = compile_instructions(instructions, &account_space, num_static)?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        })
    }

    fn num_loaded_writable(&self) -> usize {
        self.address_table_lookups
            .iter()
            .map(|l| l.writable_indexes.len())
            .sum()
    }

    /// Number of addresses resolved through lookup tables.
    pub fn num_loaded_addresses(&self) -> usize {
        self.address_table_lookups
            .iter()
            .map(|l| l.writable_indexes.len() + l.readonly_indexes.len())
            .sum()
    }

    pub fn num_total_accounts(&self) -> usize {
        self.account_keys.len() + self.num_loaded_addresses()
    }

    pub fn is_maybe_writable(&self, index: usize) -> bool {
        let num_static = self.account_keys.len();
        if index < num_static {
            is_static_writable(&self.header, num_static, index)
        } else {
            index - num_static < self.num_loaded_writable()
        }
    }
}

impl Encode for Message {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        enc.write(&self.header)?;
        enc.write_compact_vec(&self.account_keys)?;
        enc.write(&self.recent_blockhash)?;
        enc.write_compact_vec(&self.instructions)?;
        enc.write_compact_vec(&self.address_table_lookups)
    }
}

/// Decodes the body after the version byte.
impl Decode for Message {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let header: MessageHeader = dec.read()?;
        let account_keys: Vec<Pubkey> = dec.read_compact_vec()?;
        let recent_blockhash = dec.read()?;
        let instructions: Vec<CompiledInstruction> = dec.read_compact_vec()?;
        let address_table_lookups: Vec<MessageAddressTableLookup> = dec.read_compact_vec()?;

        let message = Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        };
        check_header(&message.header, message.account_keys.len())?;
        if message.num_total_accounts() > usize::from(u8::MAX) + 1 {
            return Err(CodecError::InvalidHeader("more than 256 accounts"));
        }
        check_instruction_indexes(
            &message.instructions,
            message.account_keys.len(),
            message.num_total_accounts(),
        )?;
        Ok(message)
    }
}
