use std::collections::BTreeMap;

use crate::address::Pubkey;
use crate::error::ValidationError;
use crate::instruction::Instruction;
use crate::message::{AddressLookupTableAccount, MessageAddressTableLookup, MessageHeader};

/// Keys referenced by an instruction list with their merged flags, kept in
/// byte order so every class comes out sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledKeys {
    payer: Pubkey,
    key_meta_map: BTreeMap<Pubkey, CompiledKeyMeta>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CompiledKeyMeta {
    is_signer: bool,
    is_writable: bool,
    is_invoked: bool,
}

/// Addresses resolved through lookup tables, in table order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct LoadedAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

impl CompiledKeys {
    /// Merges every account meta and program id; the payer is forced to a
    /// writable signer.
    pub(crate) fn compile(instructions: &[Instruction], payer: Pubkey) -> Self {
        let mut key_meta_map = BTreeMap::<Pubkey, CompiledKeyMeta>::new();
        for ix in instructions {
            key_meta_map.entry(ix.program_id).or_default().is_invoked = true;
            for account_meta in &ix.accounts {
                let meta = key_meta_map.entry(account_meta.pubkey).or_default();
                meta.is_signer |= account_meta.is_signer;
                meta.is_writable |= account_meta.is_writable;
            }
        }

        let payer_meta = key_meta_map.entry(payer).or_default();
        payer_meta.is_signer = true;
        payer_meta.is_writable = true;

        Self {
            payer,
            key_meta_map,
        }
    }

    /// Moves the non-signer, non-program keys found in `table` out of the
    /// in-line set. Returns `None` when the table contributes nothing.
    pub(crate) fn try_extract_table_lookup(
        &mut self,
        table: &AddressLookupTableAccount,
    ) -> Result<Option<(MessageAddressTableLookup, LoadedAddresses)>, ValidationError> {
        let (writable_indexes, writable) =
            self.try_drain_keys_found_in_lookup_table(&table.addresses, |meta| {
                !meta.is_signer && !meta.is_invoked && meta.is_writable
            })?;
        let (readonly_indexes, readonly) =
            self.try_drain_keys_found_in_lookup_table(&table.addresses, |meta| {
                !meta.is_signer && !meta.is_invoked && !meta.is_writable
            })?;

        if writable_indexes.is_empty() && readonly_indexes.is_empty() {
            return Ok(None);
        }

        Ok(Some((
            MessageAddressTableLookup {
                account_key: table.key,
                writable_indexes,
                readonly_indexes,
            },
            LoadedAddresses { writable, readonly },
        )))
    }

    fn try_drain_keys_found_in_lookup_table(
        &mut self,
        table_addresses: &[Pubkey],
        key_meta_filter: impl Fn(&CompiledKeyMeta) -> bool,
    ) -> Result<(Vec<u8>, Vec<Pubkey>), ValidationError> {
        let mut lookup_table_indexes = Vec::new();
        let mut drained_keys = Vec::new();

        for search_key in self
            .key_meta_map
            .iter()
            .filter_map(|(key, meta)| (*key != self.payer && key_meta_filter(meta)).then_some(*key))
            .collect::<Vec<_>>()
        {
            let Some(position) = table_addresses.iter().position(|key| *key == search_key) else {
                continue;
            };
            let index = u8::try_from(position)
                .map_err(|_| ValidationError::AddressTableIndexOverflow)?;
            lookup_table_indexes.push(index);
            drained_keys.push(search_key);
            self.key_meta_map.remove(&search_key);
        }

        Ok((lookup_table_indexes, drained_keys))
    }

    /// Header counts plus the in-line key table:
    /// payer, writable signers, readonly signers, writable then readonly
    /// non-signers.
    pub(crate) fn try_into_message_components(
        self,
    ) -> Result<(MessageHeader, Vec<Pubkey>), ValidationError> {
        let try_into_u8 =
            |n: usize| -> Result<u8, ValidationError> { u8::try_from(n).map_err(|_| ValidationError::TooManyAccounts) };

        let payer = self.payer;
        let class = |signer: bool, writable: bool| -> Vec<Pubkey> {
            self.key_meta_map
                .iter()
                .filter(|(key, meta)| {
                    **key != payer && meta.is_signer == signer && meta.is_writable == writable
                })
                .map(|(key, _)| *key)
                .collect()
        };

        let writable_signers: Vec<Pubkey> =
            std::iter::once(payer).chain(class(true, true)).collect();
        let readonly_signers = class(true, false);
        let writable_non_signers = class(false, true);
        let readonly_non_signers = class(false, false);

        let header = MessageHeader {
            num_required_signatures: try_into_u8(writable_signers.len() + readonly_signers.len())?,
            num_readonly_signed_accounts: try_into_u8(readonly_signers.len())?,
            num_readonly_unsigned_accounts: try_into_u8(readonly_non_signers.len())?,
        };

        let static_account_keys: Vec<Pubkey> = writable_signers
            .into_iter()
            .chain(readonly_signers)
            .chain(writable_non_signers)
            .chain(readonly_non_signers)
            .collect();

        if static_account_keys.len() > usize::from(u8::MAX) + 1 {
            return Err(ValidationError::TooManyAccounts);
        }

        Ok((header, static_account_keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::AccountMeta;

    fn ix(program_id: Pubkey, accounts: Vec<AccountMeta>) -> Instruction {
        Instruction::new(program_id, accounts, vec![])
    }

    #[test]
    fn duplicates_merge_flags() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let a = Pubkey::new_unique();
        let keys = CompiledKeys::compile(
            &[ix(
                program_id,
                vec![
                    AccountMeta::new_readonly(a, true),
                    AccountMeta::new(a, false),
                    AccountMeta::new_readonly(a, false),
                ],
            )],
            payer,
        );
        let (header, static_keys) = keys.try_into_message_components().unwrap();
        assert_eq!(static_keys, vec![payer, a, program_id]);
        assert_eq!(header.num_required_signatures, 2);
        assert_eq!(header.num_readonly_signed_accounts, 0);
        assert_eq!(header.num_readonly_unsigned_accounts, 1);
    }

    #[test]
    fn payer_goes_first_even_when_larger() {
        let program_id = Pubkey::from([9u8; 32]);
        let small = Pubkey::from([1u8; 32]);
        let payer = Pubkey::from([0xffu8; 32]);
        let keys = CompiledKeys::compile(
            &[ix(program_id, vec![AccountMeta::new(small, true)])],
            payer,
        );
        let (_, static_keys) = keys.try_into_message_components().unwrap();
        assert_eq!(static_keys, vec![payer, small, program_id]);
    }

    #[test]
    fn payer_listed_readonly_is_promoted() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let keys = CompiledKeys::compile(
            &[ix(program_id, vec![AccountMeta::new_readonly(payer, false)])],
            payer,
        );
        let (header, static_keys) = keys.try_into_message_components().unwrap();
        assert_eq!(static_keys, vec![payer, program_id]);
        assert_eq!(header.num_required_signatures, 1);
        assert_eq!(header.num_readonly_signed_accounts, 0);
    }

    #[test]
    fn drains_only_plain_non_signers() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let signer = Pubkey::new_unique();
        let writable = Pubkey::new_unique();
        let readonly = Pubkey::new_unique();
        let invoked_too = Pubkey::new_unique();

        let mut keys = CompiledKeys::compile(
            &[
                ix(
                    program_id,
                    vec![
                        AccountMeta::new_readonly(signer, true),
                        AccountMeta::new(writable, false),
                        AccountMeta::new_readonly(readonly, false),
                        AccountMeta::new_readonly(invoked_too, false),
                    ],
                ),
                ix(invoked_too, vec![]),
            ],
            payer,
        );
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![program_id, readonly, signer, invoked_too, writable, payer],
        };

        let (lookup, loaded) = keys.try_extract_table_lookup(&table).unwrap().unwrap();
        assert_eq!(lookup.account_key, table.key);
        assert_eq!(lookup.writable_indexes, vec![4]);
        assert_eq!(lookup.readonly_indexes, vec![1]);
        assert_eq!(loaded.writable, vec![writable]);
        assert_eq!(loaded.readonly, vec![readonly]);

        let (_, static_keys) = keys.try_into_message_components().unwrap();
        assert!(static_keys.contains(&signer));
        assert!(static_keys.contains(&program_id));
        assert!(static_keys.contains(&invoked_too));
        assert!(!static_keys.contains(&readonly));
        assert!(!static_keys.contains(&writable));
    }

    #[test]
    fn unrelated_table_yields_nothing() {
        let mut keys = CompiledKeys::compile(
            &[ix(Pubkey::new_unique(), vec![AccountMeta::new(Pubkey::new_unique(), false)])],
            Pubkey::new_unique(),
        );
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![Pubkey::new_unique()],
        };
        assert_eq!(keys.try_extract_table_lookup(&table).unwrap(), None);
    }

    #[test]
    fn table_index_overflow() {
        let target = Pubkey::new_unique();
        let mut addresses: Vec<Pubkey> = (0..256).map(|_| Pubkey::new_unique()).collect();
        addresses.push(target);
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses,
        };
        let mut keys = CompiledKeys::compile(
            &[ix(Pubkey::new_unique(), vec![AccountMeta::new(target, false)])],
            Pubkey::new_unique(),
        );
        assert_eq!(
            keys.try_extract_table_lookup(&table),
            Err(ValidationError::AddressTableIndexOverflow)
        );
    }

    #[test]
    fn too_many_signers() {
        let accounts: Vec<AccountMeta> = (0..256)
            .map(|_| AccountMeta::new(Pubkey::new_unique(), true))
            .collect();
        let keys = CompiledKeys::compile(&[ix(Pubkey::new_unique(), accounts)], Pubkey::new_unique());
        assert_eq!(
            keys.try_into_message_components(),
            Err(ValidationError::TooManyAccounts)
        );
    }
}
