//! System program: lamport transfers and account creation.
//! Instructions lead with a little-endian u32 tag.

use crate::address::Pubkey;
use crate::codec::{Decoder, Encoder};
use crate::error::{CodecError, SolError};
use crate::instruction::{AccountMeta, Instruction, ProgramInstruction};
use crate::programs::ids::{SYSTEM_PROGRAM_ID, SYSVAR_RECENT_BLOCKHASHES_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemInstruction {
    CreateAccount {
        lamports: u64,
        space: u64,
        owner: Pubkey,
    },
    Assign {
        owner: Pubkey,
    },
    Transfer {
        lamports: u64,
    },
    AdvanceNonceAccount,
}

impl SystemInstruction {
    fn tag(&self) -> u32 {
        match self {
            Self::CreateAccount { .. } => 0,
            Self::Assign { .. } => 1,
            Self::Transfer { .. } => 2,
            Self::AdvanceNonceAccount => 4,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(52);
        enc.write_u32(self.tag());
        match self {
            Self::CreateAccount {
                lamports,
                space,
                owner,
            } => {
                enc.write_u64(*lamports);
                enc.write_u64(*space);
                enc.write_fixed(owner.as_ref());
            }
            Self::Assign { owner } => enc.write_fixed(owner.as_ref()),
            Self::Transfer { lamports } => enc.write_u64(*lamports),
            Self::AdvanceNonceAccount => {}
        }
        enc.into_inner()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(data);
        let ix = match dec.read_u32()? {
            0 => Self::CreateAccount {
                lamports: dec.read_u64()?,
                space: dec.read_u64()?,
                owner: dec.read()?,
            },
            1 => Self::Assign { owner: dec.read()? },
            2 => Self::Transfer {
                lamports: dec.read_u64()?,
            },
            4 => Self::AdvanceNonceAccount,
            other => return Err(CodecError::UnknownDiscriminator(u64::from(other))),
        };
        dec.finish()?;
        Ok(ix)
    }
}

fn build(ix: &SystemInstruction, accounts: Vec<AccountMeta>) -> Instruction {
    Instruction::new(SYSTEM_PROGRAM_ID, accounts, ix.pack())
}

/// Moves `lamports` from `from` (signer) to `to`.
pub fn transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    build(
        &SystemInstruction::Transfer { lamports },
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
    )
}

/// Funds and allocates `new_account` (which must also sign) for `owner`.
pub fn create_account(
    from: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    build(
        &SystemInstruction::CreateAccount {
            lamports,
            space,
            owner: *owner,
        },
        vec![
            AccountMeta::new(*from, true),
            AccountMeta::new(*new_account, true),
        ],
    )
}

pub fn assign(account: &Pubkey, owner: &Pubkey) -> Instruction {
    build(
        &SystemInstruction::Assign { owner: *owner },
        vec![AccountMeta::new(*account, true)],
    )
}

/// Must be the first instruction of a durable-nonce transaction.
pub fn advance_nonce_account(nonce_account: &Pubkey, authority: &Pubkey) -> Instruction {
    build(
        &SystemInstruction::AdvanceNonceAccount,
        vec![
            AccountMeta::new(*nonce_account, false),
            AccountMeta::new_readonly(SYSVAR_RECENT_BLOCKHASHES_ID, false),
            AccountMeta::new_readonly(*authority, true),
        ],
    )
}

/// Typed transfer, for callers that assemble instructions through
/// [`ProgramInstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
}

impl ProgramInstruction for Transfer {
    fn program_id(&self) -> Pubkey {
        SYSTEM_PROGRAM_ID
    }

    fn accounts(&self) -> Result<Vec<AccountMeta>, SolError> {
        Ok(vec![
            AccountMeta::new(self.from, true),
            AccountMeta::new(self.to, false),
        ])
    }

    fn data(&self) -> Result<Vec<u8>, SolError> {
        Ok(SystemInstruction::Transfer {
            lamports: self.lamports,
        }
        .pack())
    }
}
