//! Compute budget program. One-byte tag, no accounts.

use crate::codec::{Decoder, Encoder};
use crate::error::CodecError;
use crate::instruction::Instruction;
use crate::programs::ids::COMPUTE_BUDGET_PROGRAM_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBudgetInstruction {
    RequestHeapFrame(u32),
    SetComputeUnitLimit(u32),
    /// Micro-lamports per compute unit.
    SetComputeUnitPrice(u64),
    SetLoadedAccountsDataSizeLimit(u32),
}

impl ComputeBudgetInstruction {
    pub fn pack(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(9);
        match *self {
            Self::RequestHeapFrame(bytes) => {
                enc.write_u8(1);
                enc.write_u32(bytes);
            }
            Self::SetComputeUnitLimit(units) => {
                enc.write_u8(2);
                enc.write_u32(units);
            }
            Self::SetComputeUnitPrice(micro_lamports) => {
                enc.write_u8(3);
                enc.write_u64(micro_lamports);
            }
            Self::SetLoadedAccountsDataSizeLimit(bytes) => {
                enc.write_u8(4);
                enc.write_u32(bytes);
            }
        }
        enc.into_inner()
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(data);
        let ix = match dec.read_u8()? {
            1 => Self::RequestHeapFrame(dec.read_u32()?),
            2 => Self::SetComputeUnitLimit(dec.read_u32()?),
            3 => Self::SetComputeUnitPrice(dec.read_u64()?),
            4 => Self::SetLoadedAccountsDataSizeLimit(dec.read_u32()?),
            other => return Err(CodecError::UnknownDiscriminator(u64::from(other))),
        };
        dec.finish()?;
        Ok(ix)
    }

    pub fn to_instruction(&self) -> Instruction {
        Instruction::new(COMPUTE_BUDGET_PROGRAM_ID, vec![], self.pack())
    }
}

pub fn request_heap_frame(bytes: u32) -> Instruction {
    ComputeBudgetInstruction::RequestHeapFrame(bytes).to_instruction()
}

pub fn set_compute_unit_limit(units: u32) -> Instruction {
    ComputeBudgetInstruction::SetComputeUnitLimit(units).to_instruction()
}

pub fn set_compute_unit_price(micro_lamports: u64) -> Instruction {
    ComputeBudgetInstruction::SetComputeUnitPrice(micro_lamports).to_instruction()
}
