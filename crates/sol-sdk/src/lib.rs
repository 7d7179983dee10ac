//! Offline half of the Solana client SDK.
//!
//! Keys and addresses, program-derived addresses, the binary wire codec,
//! instruction builders for common programs, message compilation (legacy
//! and v0 with address lookup tables), and transaction signing. Nothing in
//! this crate touches the network; see `sol-rpc` for that.
//!
//! Signing uses `ed25519-dalek`; the on-curve check for program-derived
//! addresses uses `curve25519-dalek` directly.

mod macros;

pub mod address;
pub mod codec;
pub mod error;
pub mod hash;
pub mod instruction;
pub mod keypair;
pub mod message;
pub mod pda;
pub mod programs;
pub mod signature;
pub mod transaction;

pub use address::Pubkey;
pub use error::{CodecError, ErrorKind, SolError, ValidationError};
pub use hash::Hash;
pub use instruction::{AccountMeta, Instruction, ProgramInstruction};
pub use keypair::{Keypair, Presigner, Signer};
pub use message::{
    AddressLookupTableAccount, CompiledInstruction, MessageAddressTableLookup, MessageHeader,
    MessageVersion, VersionedMessage,
};
pub use pda::{create_program_address, find_program_address, PdaError};
pub use signature::Signature;
pub use transaction::{Transaction, PACKET_DATA_SIZE};
