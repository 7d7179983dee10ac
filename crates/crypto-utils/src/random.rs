use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Length of an ed25519 secret seed.
pub const SEED_LEN: usize = 32;

/// Fills a fixed-size array from the operating system's CSPRNG.
///
/// The buffer is wrapped in [`Zeroizing`] so it is wiped when the caller
/// drops it. Fails only if the OS entropy source is unavailable.
pub fn try_random_array<const N: usize>() -> Result<Zeroizing<[u8; N]>, CryptoError> {
    let mut buf = Zeroizing::new([0u8; N]);
    OsRng
        .try_fill_bytes(&mut buf[..])
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
    Ok(buf)
}

/// Draws a fresh 32-byte ed25519 seed.
pub fn random_seed() -> Result<Zeroizing<[u8; SEED_LEN]>, CryptoError> {
    try_random_array::<SEED_LEN>()
}
