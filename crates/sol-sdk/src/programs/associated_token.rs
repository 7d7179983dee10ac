//! Associated token account program.

use crate::address::Pubkey;
use crate::error::SolError;
use crate::instruction::{AccountMeta, Instruction};
use crate::pda::find_associated_token_address_with_program;
use crate::programs::ids::{ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID};

fn build(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
    data: Vec<u8>,
) -> Result<Instruction, SolError> {
    let (ata, _) = find_associated_token_address_with_program(wallet, mint, token_program_id)?;
    Ok(Instruction::new(
        ASSOCIATED_TOKEN_PROGRAM_ID,
        vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(ata, false),
            AccountMeta::new_readonly(*wallet, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(*token_program_id, false),
        ],
        data,
    ))
}

/// Creates the associated token account of `wallet` for `mint`, funded by
/// `payer`. Fails on-chain if the account already exists.
pub fn create(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
) -> Result<Instruction, SolError> {
    build(payer, wallet, mint, token_program_id, Vec::new())
}

/// Like [`create`] but succeeds when the account already exists.
pub fn create_idempotent(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
) -> Result<Instruction, SolError> {
    build(payer, wallet, mint, token_program_id, vec![1])
}
