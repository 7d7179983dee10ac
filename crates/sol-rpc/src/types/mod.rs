//! Wire types shared by the call and subscription catalogs.

pub mod commitment;
pub mod config;
pub mod encoding;
pub mod filter;
pub mod response;

pub use commitment::{CommitmentConfig, CommitmentLevel};
pub use config::*;
pub use encoding::{TransactionDetails, TransactionEncoding, UiAccountEncoding, UiTransactionEncoding};
pub use filter::{Memcmp, RpcFilterType};
pub use response::*;
