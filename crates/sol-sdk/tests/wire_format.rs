//! End-to-end tests over the public API: build instructions, compile
//! messages, sign, serialize, and parse back.

use proptest::prelude::*;
use rand::{Rng, RngCore};
use sol_sdk::codec::{decode_compact_u16, encode_compact_u16};
use sol_sdk::pda::find_associated_token_address;
use sol_sdk::programs::{ids, system, token};
use sol_sdk::*;

const SAMPLE_KEYPAIR: [u8; 64] = [
    255, 101, 36, 24, 124, 23, 167, 21, 132, 204, 155, 5, 185, 58, 121, 75, 156, 227, 116, 193,
    215, 38, 142, 22, 8, 14, 229, 239, 119, 93, 5, 218, 36, 100, 158, 252, 33, 161, 97, 185, 62,
    89, 99, 195, 250, 249, 187, 189, 171, 118, 241, 90, 248, 14, 68, 219, 231, 62, 157, 5, 142, 27,
    210, 117,
];

fn sample_transaction() -> Transaction {
    let payer = Keypair::from_bytes(&SAMPLE_KEYPAIR).unwrap();
    let to = Pubkey::new_from_array([
        1, 1, 1, 4, 5, 6, 7, 8, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 8, 7, 6, 5, 4, 1,
        1, 1,
    ]);
    let program_id = Pubkey::new_from_array([
        2, 2, 2, 4, 5, 6, 7, 8, 9, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 9, 8, 7, 6, 5, 4, 2,
        2, 2,
    ]);
    let ix = Instruction::new(
        program_id,
        vec![
            AccountMeta::new(payer.pubkey(), true),
            AccountMeta::new(to, false),
        ],
        vec![1, 2, 3],
    );
    Transaction::new_signed(&payer.pubkey(), &[ix], Hash::default(), &[], &[&payer]).unwrap()
}

// ─── Golden vectors ─────────────────────────────────────────────────

#[test]
fn sample_transaction_matches_reference_bytes() {
    let tx = sample_transaction();
    assert_eq!(
        tx.serialize().unwrap(),
        vec![
            1, 120, 138, 162, 185, 59, 209, 241, 157, 71, 157, 74, 131, 4, 87, 54, 28, 38, 180,
            222, 82, 64, 62, 61, 62, 22, 46, 17, 203, 187, 136, 62, 43, 11, 38, 235, 17, 239, 82,
            240, 139, 130, 217, 227, 214, 9, 242, 141, 223, 94, 29, 184, 110, 62, 32, 87, 137, 63,
            139, 100, 221, 20, 137, 4, 5, 1, 0, 1, 3, 36, 100, 158, 252, 33, 161, 97, 185, 62, 89,
            99, 195, 250, 249, 187, 189, 171, 118, 241, 90, 248, 14, 68, 219, 231, 62, 157, 5,
            142, 27, 210, 117, 1, 1, 1, 4, 5, 6, 7, 8, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9,
            9, 9, 8, 7, 6, 5, 4, 1, 1, 1, 2, 2, 2, 4, 5, 6, 7, 8, 9, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
            1, 1, 1, 1, 9, 8, 7, 6, 5, 4, 2, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 2, 0, 1, 3, 1, 2, 3
        ]
    );
}

#[test]
fn sample_transaction_parses_and_verifies() {
    let tx = sample_transaction();
    let bytes = tx.serialize().unwrap();
    let parsed = Transaction::deserialize(&bytes).unwrap();
    assert_eq!(parsed, tx);
    parsed.verify().unwrap();
    assert!(parsed.is_signed());
    assert_eq!(parsed.message.version(), MessageVersion::Legacy);
}

#[test]
fn system_program_id_round_trips_through_base58() {
    let s = "11111111111111111111111111111111";
    let key: Pubkey = s.parse().unwrap();
    assert_eq!(key.to_bytes(), [0u8; 32]);
    assert_eq!(key.to_string(), s);
    assert_eq!(key, ids::SYSTEM_PROGRAM_ID);
}

#[test]
fn compact_u16_canonical_forms() {
    let cases: [(u16, &[u8]); 6] = [
        (0, &[0x00]),
        (127, &[0x7f]),
        (128, &[0x80, 0x01]),
        (16383, &[0xff, 0x7f]),
        (16384, &[0x80, 0x80, 0x01]),
        (65535, &[0xff, 0xff, 0x03]),
    ];
    for (value, bytes) in cases {
        assert_eq!(encode_compact_u16(value), bytes);
        assert_eq!(decode_compact_u16(bytes).unwrap(), (value, bytes.len()));
    }
    assert!(decode_compact_u16(&[0x80, 0x80, 0x80, 0x00]).is_err());
}

#[test]
fn associated_token_address_matches_chain() {
    let wallet: Pubkey = "HfasueN6RNPjSM6rKGH5dga6kS2oUF8siGH3m4MXPURp".parse().unwrap();
    let mint: Pubkey = "24PNhTaNtomHhoy3fTRaMhAFCRj4uHqhZEEoWrKDbR5p".parse().unwrap();
    let (ata, bump) = find_associated_token_address(&wallet, &mint).unwrap();
    assert_eq!(ata.to_string(), "BeRexE9vZSdQMNg65PAnhy3rRPUxF6oWsxyNegYxySZD");
    assert_eq!(bump, 253);
    assert!(!ata.is_on_curve());
}

// ─── Message assembly ───────────────────────────────────────────────

#[test]
fn single_transfer_compiles_to_three_keys() {
    let from = Keypair::new().unwrap();
    let to = Pubkey::new_unique();
    let blockhash = hash::hash(b"blockhash");
    let ix = system::transfer(&from.pubkey(), &to, 5_000);

    let message = VersionedMessage::compile(&from.pubkey(), &[ix.clone()], blockhash, &[]).unwrap();
    assert_eq!(
        message.static_account_keys(),
        &[from.pubkey(), to, ids::SYSTEM_PROGRAM_ID]
    );
    assert_eq!(
        *message.header(),
        MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 1,
        }
    );
    let compiled = &message.instructions()[0];
    assert_eq!(compiled.program_id_index, 2);
    assert_eq!(compiled.accounts, vec![0, 1]);
    assert_eq!(compiled.data, ix.data);
    assert_eq!(compiled.data.len(), 12);
}

#[test]
fn lookup_table_account_is_loaded_by_index() {
    let payer = Keypair::new().unwrap();
    let readonly = Pubkey::new_unique();
    let program = Pubkey::new_unique();
    let mut addresses: Vec<Pubkey> = (0..10).map(|_| Pubkey::new_unique()).collect();
    addresses[7] = readonly;
    let table = AddressLookupTableAccount {
        key: Pubkey::new_unique(),
        addresses,
    };
    let ix = Instruction::new(
        program,
        vec![AccountMeta::new_readonly(readonly, false)],
        vec![],
    );

    let tx = Transaction::new_signed(
        &payer.pubkey(),
        &[ix],
        Hash::default(),
        std::slice::from_ref(&table),
        &[&payer],
    )
    .unwrap();
    let message = &tx.message;
    assert_eq!(message.version(), MessageVersion::V0);
    assert_eq!(message.static_account_keys(), &[payer.pubkey(), program]);

    let lookups = message.address_table_lookups().unwrap();
    assert_eq!(
        lookups,
        &[MessageAddressTableLookup {
            account_key: table.key,
            writable_indexes: vec![],
            readonly_indexes: vec![7],
        }]
    );
    assert_eq!(message.instructions()[0].accounts, vec![2]);

    let bytes = tx.serialize().unwrap();
    // one signature, then the version prefix
    assert_eq!(bytes[1 + 64], 0x80);
    let parsed = Transaction::deserialize(&bytes).unwrap();
    assert_eq!(parsed, tx);
    parsed.verify().unwrap();
}

#[test]
fn spl_transfer_with_compute_budget_fits_in_a_packet() {
    let owner = Keypair::new().unwrap();
    let mint = Pubkey::new_unique();
    let recipient = Pubkey::new_unique();
    let (source, _) = find_associated_token_address(&owner.pubkey(), &mint).unwrap();
    let (destination, _) = find_associated_token_address(&recipient, &mint).unwrap();

    let instructions = vec![
        programs::compute_budget::set_compute_unit_limit(200_000),
        programs::compute_budget::set_compute_unit_price(10_000),
        programs::associated_token::create_idempotent(
            &owner.pubkey(),
            &recipient,
            &mint,
            &ids::TOKEN_PROGRAM_ID,
        )
        .unwrap(),
        token::TransferChecked {
            source: Some(source),
            mint: Some(mint),
            destination: Some(destination),
            authority: Some(owner.pubkey()),
            amount: Some(1_500_000),
            decimals: Some(6),
            ..Default::default()
        }
        .validate_and_build()
        .unwrap(),
        programs::memo::memo("invoice 42", &[owner.pubkey()]),
    ];

    let tx = Transaction::new_signed(
        &owner.pubkey(),
        &instructions,
        hash::hash(b"recent"),
        &[],
        &[&owner],
    )
    .unwrap();
    tx.verify().unwrap();
    assert_eq!(tx.message.header().num_required_signatures, 1);
    assert!(tx.ensure_within_packet_limit().unwrap() <= PACKET_DATA_SIZE);
}

#[test]
fn two_signers_can_sign_in_separate_passes() {
    let payer = Keypair::new().unwrap();
    let cosigner = Keypair::new().unwrap();
    let ix = Instruction::new(
        Pubkey::new_unique(),
        vec![AccountMeta::new_readonly(cosigner.pubkey(), true)],
        vec![],
    );
    let message = VersionedMessage::compile(&payer.pubkey(), &[ix], Hash::default(), &[]).unwrap();
    let mut tx = Transaction::new_unsigned(message);

    tx.partial_sign(&[&cosigner]).unwrap();
    assert!(!tx.is_signed());
    assert!(tx.verify().is_err());

    tx.partial_sign(&[&payer]).unwrap();
    assert!(tx.is_signed());
    tx.verify().unwrap();
}

// ─── Hostile input ──────────────────────────────────────────────────

#[test]
fn random_bytes_never_panic_the_parser() {
    let mut rng = rand::thread_rng();
    for len in 0..600 {
        let mut buf = vec![0u8; len];
        rng.fill_bytes(&mut buf);
        let _ = Transaction::deserialize(&buf);
        let _ = VersionedMessage::deserialize(&buf);
    }
}

#[test]
fn corrupted_transactions_fail_verification_or_parsing() {
    let bytes = sample_transaction().serialize().unwrap();
    let mut rng = rand::thread_rng();
    for _ in 0..256 {
        let mut corrupted = bytes.clone();
        let at = rng.gen_range(0..corrupted.len());
        corrupted[at] ^= rng.gen_range(1..=u8::MAX);
        if let Ok(tx) = Transaction::deserialize(&corrupted) {
            assert!(tx.verify().is_err(), "flip at byte {at} still verified");
        }
    }
}

// ─── Assembler invariants ───────────────────────────────────────────

const POOL: usize = 8;
const PROGRAMS: usize = 3;

fn account(i: usize) -> Pubkey {
    Pubkey::new_from_array([i as u8 + 1; 32])
}

fn program(i: usize) -> Pubkey {
    Pubkey::new_from_array([0xf0 + i as u8; 32])
}

fn instruction_strategy() -> impl Strategy<Value = Instruction> {
    (
        0..PROGRAMS,
        prop::collection::vec((0..POOL, any::<bool>(), any::<bool>()), 0..5),
        prop::collection::vec(any::<u8>(), 0..8),
    )
        .prop_map(|(p, metas, data)| {
            let accounts = metas
                .into_iter()
                .map(|(i, is_signer, is_writable)| AccountMeta {
                    pubkey: account(i),
                    is_signer,
                    is_writable,
                })
                .collect();
            Instruction::new(program(p), accounts, data)
        })
}

proptest! {
    #[test]
    fn compiled_legacy_message_is_consistent(
        instructions in prop::collection::vec(instruction_strategy(), 1..5),
        payer_index in 0..POOL,
    ) {
        let payer = account(payer_index);
        let message = VersionedMessage::compile(&payer, &instructions, Hash::default(), &[]).unwrap();
        let keys = message.static_account_keys();
        let header = message.header();

        prop_assert_eq!(keys[0], payer);
        let mut sorted = keys.to_vec();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), keys.len());
        prop_assert!(header.num_required_signatures >= 1);
        prop_assert!(header.num_readonly_signed_accounts < header.num_required_signatures);

        for (pos, key) in keys.iter().enumerate() {
            let metas: Vec<&AccountMeta> = instructions
                .iter()
                .flat_map(|ix| &ix.accounts)
                .filter(|m| m.pubkey == *key)
                .collect();
            let signer = *key == payer || metas.iter().any(|m| m.is_signer);
            let writable = *key == payer || metas.iter().any(|m| m.is_writable);
            prop_assert_eq!(message.is_signer(pos), signer);
            prop_assert_eq!(message.is_maybe_writable(pos), writable);
        }

        for (ix, compiled) in instructions.iter().zip(message.instructions()) {
            prop_assert_eq!(keys[usize::from(compiled.program_id_index)], ix.program_id);
            let resolved: Vec<Pubkey> = compiled.accounts.iter().map(|&i| keys[usize::from(i)]).collect();
            let expected: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
            prop_assert_eq!(resolved, expected);
            prop_assert_eq!(&compiled.data, &ix.data);
        }

        let parsed = VersionedMessage::deserialize(&message.serialize().unwrap()).unwrap();
        prop_assert_eq!(parsed, message);
    }

    #[test]
    fn lookup_tables_never_hold_signers_or_programs(
        instructions in prop::collection::vec(instruction_strategy(), 1..5),
        payer_index in 0..POOL,
    ) {
        let payer = account(payer_index);
        let table = AddressLookupTableAccount {
            key: Pubkey::new_from_array([0xaa; 32]),
            addresses: (0..POOL).map(account).chain((0..PROGRAMS).map(program)).collect(),
        };
        let message = VersionedMessage::compile_v0(
            &payer,
            &instructions,
            Hash::default(),
            std::slice::from_ref(&table),
        )
        .unwrap();

        let lookups = message.address_table_lookups().unwrap();
        let mut all_keys = message.static_account_keys().to_vec();
        let num_static = all_keys.len();
        for lookup in lookups {
            all_keys.extend(lookup.writable_indexes.iter().map(|&i| table.addresses[usize::from(i)]));
        }
        for lookup in lookups {
            all_keys.extend(lookup.readonly_indexes.iter().map(|&i| table.addresses[usize::from(i)]));
        }

        for (pos, key) in all_keys.iter().enumerate().skip(num_static) {
            let metas: Vec<&AccountMeta> = instructions
                .iter()
                .flat_map(|ix| &ix.accounts)
                .filter(|m| m.pubkey == *key)
                .collect();
            prop_assert!(*key != payer);
            prop_assert!(!metas.iter().any(|m| m.is_signer));
            prop_assert!(!instructions.iter().any(|ix| ix.program_id == *key));
            prop_assert_eq!(message.is_maybe_writable(pos), metas.iter().any(|m| m.is_writable));
        }

        for (ix, compiled) in instructions.iter().zip(message.instructions()) {
            prop_assert!(usize::from(compiled.program_id_index) < num_static);
            let resolved: Vec<Pubkey> = compiled.accounts.iter().map(|&i| all_keys[usize::from(i)]).collect();
            let expected: Vec<Pubkey> = ix.accounts.iter().map(|m| m.pubkey).collect();
            prop_assert_eq!(resolved, expected);
        }

        let parsed = VersionedMessage::deserialize(&message.serialize().unwrap()).unwrap();
        prop_assert_eq!(parsed, message);
    }
}
