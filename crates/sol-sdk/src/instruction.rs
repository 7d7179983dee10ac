//! Instructions: a program id, its positional account list, and an opaque
//! data payload produced by the program's own codec.

use serde::{Deserialize, Serialize};

use crate::address::Pubkey;
use crate::error::{SolError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A ready-to-compile instruction. Account order is significant: programs
/// read their accounts positionally, and the message compiler never
/// reorders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// The capability set every program instruction exposes. The typed
/// builders (`system::Transfer`, `token::Transfer`, `token::TransferChecked`)
/// implement it; [`Instruction`] implements it trivially so raw
/// instructions can be mixed with typed ones.
pub trait ProgramInstruction {
    fn program_id(&self) -> Pubkey;

    /// Fails when a builder is missing fields or its signer list is invalid.
    fn accounts(&self) -> Result<Vec<AccountMeta>, SolError>;

    fn data(&self) -> Result<Vec<u8>, SolError>;

    fn to_instruction(&self) -> Result<Instruction, SolError> {
        Ok(Instruction {
            program_id: self.program_id(),
            accounts: self.accounts()?,
            data: self.data()?,
        })
    }
}

impl ProgramInstruction for Instruction {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn accounts(&self) -> Result<Vec<AccountMeta>, SolError> {
        Ok(self.accounts.clone())
    }

    fn data(&self) -> Result<Vec<u8>, SolError> {
        Ok(self.data.clone())
    }

    fn to_instruction(&self) -> Result<Instruction, SolError> {
        Ok(self.clone())
    }
}

/// Collects the names of unset required builder fields so validation can
/// report all of them at once.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value, recording `name` when it is absent.
    pub fn take<T: Copy>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }

    /// The error for whatever was recorded; only meaningful once a `take`
    /// has come back empty.
    pub fn into_error(self) -> ValidationError {
        ValidationError::MissingFields(self.missing)
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(self.missing))
        }
    }
}
