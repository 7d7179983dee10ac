//! The original message format: every account key in-line.

use crate::address::Pubkey;
use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::error::{CodecError, ValidationError};
use crate::hash::Hash;
use crate::instruction::Instruction;
use crate::message::compiled_keys::CompiledKeys;
use crate::message::{
    check_header, check_instruction_indexes, check_legacy_signers, compile_instructions,
    is_static_writable, CompiledInstruction, MessageHeader, MAX_LEGACY_SIGNERS,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    pub fn try_compile(
        payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: Hash,
    ) -> Result<Self, ValidationError> {
        let compiled_keys = CompiledKeys::compile(instructions, *payer);
        let (header, account_keys) = compiled_keys.try_into_message_components()?;
        check_legacy_signers(&header)?;
        let instructions = compile_instructions(instructions, &account_keys, account_keys.len())?;
        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        crate::codec::to_bytes(self)
    }

    pub fn is_signer(&self, index: usize) -> bool {
        index < usize::from(self.header.num_required_signatures)
    }

    pub fn is_writable(&self, index: usize) -> bool {
        is_static_writable(&self.header, self.account_keys.len(), index)
    }

    pub fn signer_keys(&self) -> &[Pubkey] {
        let n = usize::from(self.header.num_required_signatures).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    pub fn program_id(&self, instruction_index: usize) -> Option<&Pubkey> {
        let ix = self.instructions.get(instruction_index)?;
        self.account_keys.get(usize::from(ix.program_id_index))
    }
}

impl Encode for Message {
    fn encode(&self, enc: &mut Encoder) -> Result<(), CodecError> {
        if self.header.num_required_signatures > MAX_LEGACY_SIGNERS {
            return Err(CodecError::InvalidHeader(
                "legacy signer count collides with the version prefix",
            ));
        }
        enc.write(&self.header)?;
        enc.write_compact_vec(&self.account_keys)?;
        enc.write(&self.recent_blockhash)?;
        enc.write_compact_vec(&self.instructions)
    }
}

impl Decode for Message {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let header: MessageHeader = dec.read()?;
        let account_keys: Vec<Pubkey> = dec.read_compact_vec()?;
        let recent_blockhash = dec.read()?;
        let instructions: Vec<CompiledInstruction> = dec.read_compact_vec()?;

        check_header(&header, account_keys.len())?;
        check_instruction_indexes(&instructions, account_keys.len(), account_keys.len())?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }
}
