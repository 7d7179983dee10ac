//! SPL memo program. The payload is the raw UTF-8 text; each listed
//! signer must sign the transaction.

use crate::address::Pubkey;
use crate::instruction::{AccountMeta, Instruction};
use crate::programs::ids::MEMO_PROGRAM_ID;

pub fn memo(text: &str, signers: &[Pubkey]) -> Instruction {
    Instruction::new(
        MEMO_PROGRAM_ID,
        signers
            .iter()
            .map(|signer| AccountMeta::new_readonly(*signer, true))
            .collect(),
        text.as_bytes().to_vec(),
    )
}
