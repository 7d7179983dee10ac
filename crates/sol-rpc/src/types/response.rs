//! Typed results. Unknown keys are ignored everywhere so newer servers can
//! add fields without breaking decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sol_sdk::{Hash, MessageHeader, Pubkey, Signature, Transaction};

use super::commitment::CommitmentLevel;
use crate::serde_utils::{option_u64_or_string, u64_or_string, vec_u64_or_string};
use crate::sol_data::SolData;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponseContext {
    pub slot: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// `{context, value}` wrapper used by reads that report the slot they
/// observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    pub context: RpcResponseContext,
    pub value: T,
}

/// Results that are context-wrapped only when the caller asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionalContext<T> {
    Context(RpcResponse<T>),
    NoContext(T),
}

impl<T> OptionalContext<T> {
    pub fn parse_value(self) -> T {
        match self {
            Self::Context(response) => response.value,
            Self::NoContext(value) => value,
        }
    }
}

// ─── Accounts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAccount {
    pub program: String,
    pub parsed: Value,
    pub space: u64,
}

/// Account data as returned by the server: an encoded blob, or a parsed
/// JSON view when `jsonParsed` was requested and the owner is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiAccountData {
    Binary(SolData),
    Json(ParsedAccount),
}

impl UiAccountData {
    /// Raw bytes, unless the server answered with a parsed view.
    pub fn decode(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(data) => Some(data.as_bytes()),
            Self::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAccount {
    #[serde(with = "u64_or_string")]
    pub lamports: u64,
    pub data: UiAccountData,
    pub owner: Pubkey,
    pub executable: bool,
    #[serde(with = "u64_or_string")]
    pub rent_epoch: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcKeyedAccount {
    pub pubkey: Pubkey,
    pub account: UiAccount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    #[serde(default)]
    pub ui_amount: Option<f64>,
    pub decimals: u8,
    /// Raw integer amount as a decimal string.
    pub amount: String,
    pub ui_amount_string: String,
}

impl UiTokenAmount {
    pub fn raw_amount(&self) -> Option<u64> {
        self.amount.parse().ok()
    }
}

// ─── Cluster state ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
    pub slot_index: u64,
    pub slots_in_epoch: u64,
    pub absolute_slot: u64,
    pub block_height: u64,
    #[serde(default)]
    pub transaction_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcPrioritizationFee {
    pub slot: u64,
    pub prioritization_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RpcVersionInfo {
    pub solana_core: String,
    #[serde(default)]
    pub feature_set: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcVoteAccountInfo {
    pub vote_pubkey: Pubkey,
    pub node_pubkey: Pubkey,
    #[serde(with = "u64_or_string")]
    pub activated_stake: u64,
    pub commission: u8,
    pub epoch_vote_account: bool,
    /// `(epoch, credits, previous_credits)` triples.
    pub epoch_credits: Vec<(u64, u64, u64)>,
    pub last_vote: u64,
    pub root_slot: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcVoteAccountStatus {
    pub current: Vec<RpcVoteAccountInfo>,
    pub delinquent: Vec<RpcVoteAccountInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub slot: u64,
    pub parent: u64,
    pub root: u64,
}

// ─── Signatures and statuses ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub slot: u64,
    /// `None` once the block is rooted.
    #[serde(default)]
    pub confirmations: Option<usize>,
    /// Runtime error for a failed transaction, verbatim.
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub confirmation_status: Option<TransactionConfirmationStatus>,
}

impl TransactionStatus {
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// Whether the status has reached at least `level`. Older servers omit
    /// `confirmationStatus`; a missing `confirmations` then means rooted.
    pub fn satisfies_commitment(&self, level: CommitmentLevel) -> bool {
        let reached = match self.confirmation_status {
            Some(status) => status,
            None if self.confirmations.is_none() => TransactionConfirmationStatus::Finalized,
            None => TransactionConfirmationStatus::Confirmed,
        };
        let wanted = match level {
            CommitmentLevel::Processed => TransactionConfirmationStatus::Processed,
            CommitmentLevel::Confirmed => TransactionConfirmationStatus::Confirmed,
            CommitmentLevel::Finalized => TransactionConfirmationStatus::Finalized,
        };
        reached >= wanted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcConfirmedTransactionStatusWithSignature {
    pub signature: Signature,
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub confirmation_status: Option<TransactionConfirmationStatus>,
}

// ─── Blocks and transactions ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardType {
    Fee,
    Rent,
    Staking,
    Voting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub pubkey: Pubkey,
    pub lamports: i64,
    #[serde(with = "u64_or_string")]
    pub post_balance: u64,
    #[serde(default)]
    pub reward_type: Option<RewardType>,
    #[serde(default)]
    pub commission: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Legacy {
    Legacy,
}

/// `"legacy"` or a version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionVersion {
    Legacy(Legacy),
    Number(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiCompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    /// Base58 instruction data.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiRawMessage {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<UiCompiledInstruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_table_lookups: Option<Vec<UiAddressTableLookup>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAccountKey {
    pub pubkey: Pubkey,
    pub writable: bool,
    pub signer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiParsedMessage {
    pub account_keys: Vec<ParsedAccountKey>,
    pub recent_blockhash: Hash,
    /// Program-specific parsed instructions.
    pub instructions: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_table_lookups: Option<Vec<UiAddressTableLookup>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiMessage {
    Raw(UiRawMessage),
    Parsed(UiParsedMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTransaction {
    pub signatures: Vec<Signature>,
    pub message: UiMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedTransaction {
    Binary(SolData),
    Json(UiTransaction),
}

impl EncodedTransaction {
    /// Parses binary-encoded transactions; JSON views yield `None`.
    pub fn decode(&self) -> Option<Transaction> {
        match self {
            Self::Binary(data) => Transaction::deserialize(data.as_bytes()).ok(),
            Self::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiInnerInstructions {
    pub index: u8,
    pub instructions: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTransactionTokenBalance {
    pub account_index: u8,
    pub mint: Pubkey,
    pub ui_token_amount: UiTokenAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Pubkey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<Pubkey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiLoadedAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTransactionReturnData {
    pub program_id: Pubkey,
    pub data: SolData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTransactionStatusMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(with = "u64_or_string")]
    pub fee: u64,
    #[serde(with = "vec_u64_or_string")]
    pub pre_balances: Vec<u64>,
    #[serde(with = "vec_u64_or_string")]
    pub post_balances: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_instructions: Option<Vec<UiInnerInstructions>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_messages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_token_balances: Option<Vec<UiTransactionTokenBalance>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_token_balances: Option<Vec<UiTransactionTokenBalance>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<Reward>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_addresses: Option<UiLoadedAddresses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_data: Option<UiTransactionReturnData>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_u64_or_string"
    )]
    pub compute_units_consumed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedTransactionWithStatusMeta {
    pub transaction: EncodedTransaction,
    #[serde(default)]
    pub meta: Option<UiTransactionStatusMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<TransactionVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedConfirmedTransactionWithStatusMeta {
    pub slot: u64,
    #[serde(flatten)]
    pub transaction: EncodedTransactionWithStatusMeta,
    #[serde(default)]
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfirmedBlock {
    pub previous_blockhash: Hash,
    pub blockhash: Hash,
    pub parent_slot: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<EncodedTransactionWithStatusMeta>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<Signature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<Reward>>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub block_height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSimulateTransactionResult {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    #[serde(default)]
    pub accounts: Option<Vec<Option<UiAccount>>>,
    #[serde(default)]
    pub units_consumed: Option<u64>,
    #[serde(default)]
    pub return_data: Option<UiTransactionReturnData>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<UiInnerInstructions>>,
    #[serde(default)]
    pub replacement_blockhash: Option<RpcBlockhash>,
}

// ─── Notifications ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLogsResponse {
    pub signature: Signature,
    #[serde(default)]
    pub err: Option<Value>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSignatureResult {
    #[serde(default)]
    pub err: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceivedSignatureResult {
    ReceivedSignature,
}

/// `signatureSubscribe` payload: the final result, or an early
/// `"receivedSignature"` marker when that was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcSignatureResult {
    ProcessedSignature(ProcessedSignatureResult),
    ReceivedSignature(ReceivedSignatureResult),
}
