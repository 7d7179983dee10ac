//! Program-derived addresses.
//!
//! A PDA is `sha256(seed_0 ‖ … ‖ seed_n ‖ program_id ‖ "ProgramDerivedAddress")`
//! accepted only when the digest is NOT a valid ed25519 point, so no private
//! key can exist for it.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::address::Pubkey;
use crate::programs::ids;

/// Maximum number of seeds, counting the bump.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of any single seed.
pub const MAX_SEED_LEN: usize = 32;

pub const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PdaError {
    #[error("more than {MAX_SEEDS} seeds")]
    MaxSeedsExceeded,

    #[error("seed longer than {MAX_SEED_LEN} bytes")]
    MaxSeedLengthExceeded,

    /// The digest landed on the curve; retry with different seeds.
    #[error("derived address lies on the ed25519 curve")]
    InvalidSeeds,

    #[error("no bump seed in 0..=255 yields an off-curve address")]
    NoViableBumpSeed,

    #[error("owner ends with the program-derived address marker")]
    IllegalOwner,
}

/// Derives the address for exactly these seeds. [`PdaError::InvalidSeeds`]
/// means the digest was on-curve and the caller should vary the seeds.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey, PdaError> {
    if seeds.len() > MAX_SEEDS {
        return Err(PdaError::MaxSeedsExceeded);
    }
    if seeds.iter().any(|seed| seed.len() > MAX_SEED_LEN) {
        return Err(PdaError::MaxSeedLengthExceeded);
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let address = Pubkey::from(<[u8; 32]>::from(hasher.finalize()));

    if address.is_on_curve() {
        return Err(PdaError::InvalidSeeds);
    }
    Ok(address)
}

/// Searches bump seeds from 255 down and returns the first (highest) one
/// that produces an off-curve address.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), PdaError> {
    // Room for the bump, which counts towards the limit.
    if seeds.len() >= MAX_SEEDS {
        return Err(PdaError::MaxSeedsExceeded);
    }

    for bump in (0u8..=255).rev() {
        let bump_seed = [bump];
        let mut with_bump = seeds.to_vec();
        with_bump.push(&bump_seed);

        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(PdaError::InvalidSeeds) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(PdaError::NoViableBumpSeed)
}

/// Associated token account for `wallet` and `mint` under the classic
/// token program.
pub fn find_associated_token_address(
    wallet: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, u8), PdaError> {
    find_associated_token_address_with_program(wallet, mint, &ids::TOKEN_PROGRAM_ID)
}

/// Same as [`find_associated_token_address`] for an arbitrary token program
/// (e.g. token-2022).
pub fn find_associated_token_address_with_program(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program_id: &Pubkey,
) -> Result<(Pubkey, u8), PdaError> {
    find_program_address(
        &[wallet.as_ref(), token_program_id.as_ref(), mint.as_ref()],
        &ids::ASSOCIATED_TOKEN_PROGRAM_ID,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Pubkey {
        s.parse().unwrap()
    }

    #[test]
    fn associated_token_addresses_match_chain() {
        let mint = key("24PNhTaNtomHhoy3fTRaMhAFCRj4uHqhZEEoWrKDbR5p");

        let (ata, bump) = find_associated_token_address(
            &key("HfasueN6RNPjSM6rKGH5dga6kS2oUF8siGH3m4MXPURp"),
            &mint,
        )
        .unwrap();
        assert_eq!(ata, key("BeRexE9vZSdQMNg65PAnhy3rRPUxF6oWsxyNegYxySZD"));
        assert_eq!(bump, 253);

        let (ata, bump) = find_associated_token_address(
            &key("9j17hjg8wR2uFxJAJDAFahwsgTCNx35sc5qXSxDmuuF6"),
            &mint,
        )
        .unwrap();
        assert_eq!(ata, key("DUjCLckPi4g7QAwBEwuFL1whpgY6L9fxwXnqbWvS2pcW"));
        assert_eq!(bump, 251);
    }

    #[test]
    fn find_program_address_seed_chains() {
        let program = key("J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE");

        assert_eq!(
            find_program_address(&[], &program).unwrap(),
            (key("5y4ZsPDKAXv4FTmK7C4BVhRRcqhrHYhUfYNhj1nS2EJR"), 253)
        );
        assert_eq!(
            find_program_address(&[b"01"], &program).unwrap(),
            (key("26ytLSPyng5vEbiU5oheMWjFcnsqjZ7pDZh7VeY3opVA"), 251)
        );
        assert_eq!(
            find_program_address(&[b"01", b"02"], &program).unwrap(),
            (key("56v8wrZ3XnVEDKBNf61wXGSZUytG74HL15U6QKSBPcfs"), 254)
        );
    }

    #[test]
    fn found_address_recreates_with_bump() {
        let program = Pubkey::new_unique();
        let (address, bump) = find_program_address(&[b"vault", &[1, 2, 3]], &program).unwrap();
        let again = create_program_address(&[b"vault", &[1, 2, 3], &[bump]], &program).unwrap();
        assert_eq!(address, again);
        assert!(!address.is_on_curve());
    }

    #[test]
    fn higher_bumps_are_on_curve() {
        // Every bump above the returned one must have failed.
        let program = key("J4mK4RXAuizk5aMZw8Vz8W3y7mrCy6dcgniZ4qwZimZE");
        let (_, bump) = find_program_address(&[b"01"], &program).unwrap();
        for skipped in bump.saturating_add(1)..=255 {
            assert_eq!(
                create_program_address(&[b"01", &[skipped]], &program),
                Err(PdaError::InvalidSeeds)
            );
        }
    }

    #[test]
    fn seed_limits() {
        let program = Pubkey::new_unique();
        let long = [0u8; MAX_SEED_LEN + 1];
        assert_eq!(
            create_program_address(&[&long], &program),
            Err(PdaError::MaxSeedLengthExceeded)
        );
        assert_eq!(
            find_program_address(&[&long], &program),
            Err(PdaError::MaxSeedLengthExceeded)
        );

        let exact = [0u8; MAX_SEED_LEN];
        assert!(find_program_address(&[&exact], &program).is_ok());

        let seeds: Vec<&[u8]> = vec![&b"s"[..]; MAX_SEEDS];
        assert_eq!(
            find_program_address(&seeds, &program),
            Err(PdaError::MaxSeedsExceeded)
        );
        let seeds: Vec<&[u8]> = vec![&b"s"[..]; MAX_SEEDS + 1];
        assert_eq!(
            create_program_address(&seeds, &program),
            Err(PdaError::MaxSeedsExceeded)
        );
        let seeds: Vec<&[u8]> = vec![&b"s"[..]; MAX_SEEDS - 1];
        assert!(find_program_address(&seeds, &program).is_ok());
    }
}
