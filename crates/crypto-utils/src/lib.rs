//! # crypto-utils
//!
//! Secret-material hygiene shared by the SDK crates: containers that wipe
//! themselves on drop and OS-backed randomness for fresh ed25519 seeds.

pub mod error;
pub mod random;
pub mod zeroizing;

pub use error::CryptoError;
pub use random::{random_seed, try_random_array};
pub use zeroizing::{ZeroizingBytes, ZeroizingString};
