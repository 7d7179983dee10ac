//! SPL token program (classic and token-2022 share these layouts).
//!
//! Instruction builders take every field as optional and report all unset
//! required fields together. Multisig authorities are explicit: an empty
//! `multisig_signers` list means `authority` signs directly; a non-empty
//! list means `authority` is a multisig account and the listed keys sign.

use std::collections::BTreeSet;

use crate::address::Pubkey;
use crate::codec::{Decoder, Discriminator, Encoder};
use crate::error::{CodecError, SolError, ValidationError};
use crate::instruction::{AccountMeta, Instruction, ProgramInstruction, RequiredFields};
use crate::programs::ids::TOKEN_PROGRAM_ID;

/// Signer limit of an SPL multisig account.
pub const MAX_SIGNERS: usize = 11;

const DISCRIMINATOR: Discriminator = Discriminator::U8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenInstruction {
    Transfer { amount: u64 },
    CloseAccount,
    TransferChecked { amount: u64, decimals: u8 },
    SyncNative,
}

impl TokenInstruction {
    fn tag(&self) -> u64 {
        match self {
            Self::Transfer { .. } => 3,
            Self::CloseAccount => 9,
            Self::TransferChecked { .. } => 12,
            Self::SyncNative => 17,
        }
    }

    pub fn pack(&self) -> Result<Vec<u8>, CodecError> {
        let mut enc = Encoder::with_capacity(10);
        DISCRIMINATOR.write(&mut enc, self.tag())?;
        match *self {
            Self::Transfer { amount } => enc.write_u64(amount),
            Self::TransferChecked { amount, decimals } => {
                enc.write_u64(amount);
                enc.write_u8(decimals);
            }
            Self::CloseAccount | Self::SyncNative => {}
        }
        Ok(enc.into_inner())
    }

    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(data);
        let ix = match DISCRIMINATOR.read(&mut dec)? {
            3 => Self::Transfer {
                amount: dec.read_u64()?,
            },
            9 => Self::CloseAccount,
            12 => Self::TransferChecked {
                amount: dec.read_u64()?,
                decimals: dec.read_u8()?,
            },
            17 => Self::SyncNative,
            other => return Err(CodecError::UnknownDiscriminator(other)),
        };
        dec.finish()?;
        Ok(ix)
    }
}

/// Authority account followed by its multisig signers, rejecting ambiguous
/// signer lists.
fn authority_metas(
    authority: Pubkey,
    multisig_signers: &[Pubkey],
) -> Result<Vec<AccountMeta>, ValidationError> {
    if multisig_signers.len() > MAX_SIGNERS {
        return Err(ValidationError::InvalidInstruction(format!(
            "{} multisig signers, at most {MAX_SIGNERS} allowed",
            multisig_signers.len()
        )));
    }
    let mut seen = BTreeSet::new();
    for signer in multisig_signers {
        if *signer == authority {
            return Err(ValidationError::InvalidInstruction(format!(
                "authority {authority} listed among its own multisig signers"
            )));
        }
        if !seen.insert(*signer) {
            return Err(ValidationError::InvalidInstruction(format!(
                "duplicate multisig signer {signer}"
            )));
        }
    }

    let mut metas = Vec::with_capacity(1 + multisig_signers.len());
    metas.push(AccountMeta::new_readonly(authority, multisig_signers.is_empty()));
    metas.extend(
        multisig_signers
            .iter()
            .map(|signer| AccountMeta::new_readonly(*signer, true)),
    );
    Ok(metas)
}

/// `Transfer`: moves `amount` base units between two token accounts of the
/// same mint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transfer {
    /// Defaults to the classic token program.
    pub token_program_id: Option<Pubkey>,
    pub source: Option<Pubkey>,
    pub destination: Option<Pubkey>,
    pub authority: Option<Pubkey>,
    pub amount: Option<u64>,
    pub multisig_signers: Vec<Pubkey>,
}

impl Transfer {
    pub fn validate_and_build(&self) -> Result<Instruction, SolError> {
        let mut fields = RequiredFields::new();
        let source = fields.take("source", self.source);
        let destination = fields.take("destination", self.destination);
        let authority = fields.take("authority", self.authority);
        let amount = fields.take("amount", self.amount);
        let (Some(source), Some(destination), Some(authority), Some(amount)) =
            (source, destination, authority, amount)
        else {
            return Err(fields.into_error().into());
        };

        let mut accounts = vec![
            AccountMeta::new(source, false),
            AccountMeta::new(destination, false),
        ];
        accounts.extend(authority_metas(authority, &self.multisig_signers)?);

        Ok(Instruction::new(
            self.token_program_id.unwrap_or(TOKEN_PROGRAM_ID),
            accounts,
            TokenInstruction::Transfer { amount }.pack()?,
        ))
    }
}

/// `TransferChecked`: like [`Transfer`] but the program also checks the
/// mint and its decimals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferChecked {
    pub token_program_id: Option<Pubkey>,
    pub source: Option<Pubkey>,
    pub mint: Option<Pubkey>,
    pub destination: Option<Pubkey>,
    pub authority: Option<Pubkey>,
    pub amount: Option<u64>,
    pub decimals: Option<u8>,
    pub multisig_signers: Vec<Pubkey>,
}

impl TransferChecked {
    pub fn validate_and_build(&self) -> Result<Instruction, SolError> {
        let mut fields = RequiredFields::new();
        let source = fields.take("source", self.source);
        let mint = fields.take("mint", self.mint);
        let destination = fields.take("destination", self.destination);
        let authority = fields.take("authority", self.authority);
        let amount = fields.take("amount", self.amount);
        let decimals = fields.take("decimals", self.decimals);
        let (
            Some(source),
            Some(mint),
            Some(destination),
            Some(authority),
            Some(amount),
            Some(decimals),
        ) = (source, mint, destination, authority, amount, decimals)
        else {
            return Err(fields.into_error().into());
        };

        let mut accounts = vec![
            AccountMeta::new(source, false),
            AccountMeta::new_readonly(mint, false),
            AccountMeta::new(destination, false),
        ];
        accounts.extend(authority_metas(authority, &self.multisig_signers)?);

        Ok(Instruction::new(
            self.token_program_id.unwrap_or(TOKEN_PROGRAM_ID),
            accounts,
            TokenInstruction::TransferChecked { amount, decimals }.pack()?,
        ))
    }
}

macro_rules! validated_program_instruction {
    ($builder:ty) => {
        impl ProgramInstruction for $builder {
            fn program_id(&self) -> Pubkey {
                self.token_program_id.unwrap_or(TOKEN_PROGRAM_ID)
            }

            fn accounts(&self) -> Result<Vec<AccountMeta>, SolError> {
                Ok(self.validate_and_build()?.accounts)
            }

            fn data(&self) -> Result<Vec<u8>, SolError> {
                Ok(self.validate_and_build()?.data)
            }

            fn to_instruction(&self) -> Result<Instruction, SolError> {
                self.validate_and_build()
            }
        }
    };
}

validated_program_instruction!(Transfer);
validated_program_instruction!(TransferChecked);

/// Closes `account`, sending its rent lamports to `destination`.
pub fn close_account(
    token_program_id: &Pubkey,
    account: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    multisig_signers: &[Pubkey],
) -> Result<Instruction, SolError> {
    let mut accounts = vec![
        AccountMeta::new(*account, false),
        AccountMeta::new(*destination, false),
    ];
    accounts.extend(authority_metas(*owner, multisig_signers)?);
    Ok(Instruction::new(
        *token_program_id,
        accounts,
        TokenInstruction::CloseAccount.pack()?,
    ))
}

/// Syncs a wrapped-SOL account's token balance with its lamports.
pub fn sync_native(token_program_id: &Pubkey, account: &Pubkey) -> Result<Instruction, SolError> {
    Ok(Instruction::new(
        *token_program_id,
        vec![AccountMeta::new(*account, false)],
        TokenInstruction::SyncNative.pack()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_transfer() -> Transfer {
        Transfer {
            source: Some(Pubkey::new_unique()),
            destination: Some(Pubkey::new_unique()),
            authority: Some(Pubkey::new_unique()),
            amount: Some(1_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn transfer_single_authority() {
        let t = full_transfer();
        let ix = t.validate_and_build().unwrap();
        assert_eq!(ix.program_id, TOKEN_PROGRAM_ID);
        assert_eq!(ix.data[0], 3);
        assert_eq!(&ix.data[1..], &1_000_000u64.to_le_bytes());
        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[2], AccountMeta::new_readonly(t.authority.unwrap(), true));
    }

    #[test]
    fn transfer_missing_fields_are_all_reported() {
        let err = Transfer {
            destination: Some(Pubkey::new_unique()),
            ..Default::default()
        }
        .validate_and_build()
        .unwrap_err();
        assert!(matches!(
            err,
            SolError::Validation(ValidationError::MissingFields(ref f))
                if f == &vec!["source", "authority", "amount"]
        ));
    }

    #[test]
    fn transfer_multisig() {
        let s1 = Pubkey::new_unique();
        let s2 = Pubkey::new_unique();
        let t = Transfer {
            multisig_signers: vec![s1, s2],
            ..full_transfer()
        };
        let ix = t.validate_and_build().unwrap();
        assert_eq!(ix.accounts.len(), 5);
        // multisig account itself does not sign
        assert_eq!(ix.accounts[2], AccountMeta::new_readonly(t.authority.unwrap(), false));
        assert_eq!(ix.accounts[3], AccountMeta::new_readonly(s1, true));
        assert_eq!(ix.accounts[4], AccountMeta::new_readonly(s2, true));
    }

    #[test]
    fn ambiguous_multisig_lists_are_rejected() {
        let t = full_transfer();
        let authority = t.authority.unwrap();
        let dup = Pubkey::new_unique();

        for signers in [
            vec![authority],
            vec![dup, dup],
            (0..=MAX_SIGNERS).map(|_| Pubkey::new_unique()).collect(),
        ] {
            let err = Transfer {
                multisig_signers: signers,
                ..t.clone()
            }
            .validate_and_build()
            .unwrap_err();
            assert!(matches!(
                err,
                SolError::Validation(ValidationError::InvalidInstruction(_))
            ));
        }

        let max: Vec<Pubkey> = (0..MAX_SIGNERS).map(|_| Pubkey::new_unique()).collect();
        assert!(Transfer {
            multisig_signers: max,
            ..t
        }
        .validate_and_build()
        .is_ok());
    }

    #[test]
    fn transfer_checked_layout() {
        let mint = Pubkey::new_unique();
        let program = crate::programs::ids::TOKEN_2022_PROGRAM_ID;
        let ix = TransferChecked {
            token_program_id: Some(program),
            source: Some(Pubkey::new_unique()),
            mint: Some(mint),
            destination: Some(Pubkey::new_unique()),
            authority: Some(Pubkey::new_unique()),
            amount: Some(5),
            decimals: Some(6),
            multisig_signers: vec![],
        }
        .validate_and_build()
        .unwrap();
        assert_eq!(ix.program_id, program);
        assert_eq!(ix.data, vec![12, 5, 0, 0, 0, 0, 0, 0, 0, 6]);
        assert_eq!(ix.accounts[1], AccountMeta::new_readonly(mint, false));
        assert_eq!(
            TokenInstruction::unpack(&ix.data).unwrap(),
            TokenInstruction::TransferChecked {
                amount: 5,
                decimals: 6
            }
        );
    }

    #[test]
    fn transfer_checked_requires_decimals_and_mint() {
        let err = TransferChecked::default().validate_and_build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: missing required fields: source, mint, destination, authority, amount, decimals"
        );
    }

    #[test]
    fn builders_work_through_program_instruction() {
        let t = full_transfer();
        let built: Vec<Instruction> = [
            &t as &dyn ProgramInstruction,
            &TransferChecked {
                source: t.source,
                mint: Some(Pubkey::new_unique()),
                destination: t.destination,
                authority: t.authority,
                amount: Some(7),
                decimals: Some(2),
                ..Default::default()
            },
        ]
        .iter()
        .map(|b| b.to_instruction().unwrap())
        .collect();
        assert_eq!(built[0], t.validate_and_build().unwrap());
        assert_eq!(built[0].accounts, t.accounts().unwrap());
        assert_eq!(built[1].data, vec![12, 7, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(ProgramInstruction::program_id(&t), TOKEN_PROGRAM_ID);

        let partial = Transfer {
            source: t.source,
            ..Default::default()
        };
        assert!(matches!(
            partial.accounts(),
            Err(SolError::Validation(ValidationError::MissingFields(_)))
        ));
        assert!(partial.to_instruction().is_err());
    }

    #[test]
    fn close_and_sync() {
        let account = Pubkey::new_unique();
        let ix = close_account(
            &TOKEN_PROGRAM_ID,
            &account,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &[],
        )
        .unwrap();
        assert_eq!(ix.data, vec![9]);
        assert_eq!(ix.accounts.len(), 3);

        let ix = sync_native(&TOKEN_PROGRAM_ID, &account).unwrap();
        assert_eq!(ix.data, vec![17]);
        assert_eq!(ix.accounts, vec![AccountMeta::new(account, false)]);
    }
}
