//! Per-method configuration objects. Every field is optional and omitted
//! from the wire when unset so the server's own defaults apply.

use serde::{Deserialize, Serialize};
use sol_sdk::{Hash, Pubkey, Signature};

use super::commitment::CommitmentLevel;
use super::encoding::{
    TransactionDetails, TransactionEncoding, UiAccountEncoding, UiTransactionEncoding,
};
use super::filter::RpcFilterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSlice {
    pub offset: usize,
    pub length: usize,
}

/// `commitment` and `minContextSlot`, shared by most simple reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcAccountInfoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<UiAccountEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_slice: Option<DataSlice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcProgramAccountsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<RpcFilterType>>,
    #[serde(flatten)]
    pub account_config: RpcAccountInfoConfig,
    /// Wraps the result in a context object when true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_context: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlockConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<UiTransactionEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_details: Option<TransactionDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    /// Absent means legacy transactions only; blocks containing v0
    /// transactions are then rejected by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_supported_transaction_version: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransactionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<UiTransactionEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_supported_transaction_version: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSignaturesForAddressConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSignatureStatusConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_transaction_history: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSendTransactionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_preflight: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_commitment: Option<CommitmentLevel>,
    /// Filled in before sending when unset; see
    /// [`crate::config::RpcClientConfig::send_encoding`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<TransactionEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSimulateTransactionAccountsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<UiAccountEncoding>,
    pub addresses: Vec<Pubkey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSimulateTransactionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_verify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_recent_blockhash: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<TransactionEncoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<RpcSimulateTransactionAccountsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_instructions: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcGetVoteAccountsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_pubkey: Option<Pubkey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_unstaked_delinquents: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delinquent_slot_distance: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequestAirdropConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_blockhash: Option<Hash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
}

/// Which transactions a `logsSubscribe` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcTransactionLogsFilter {
    All,
    AllWithVotes,
    /// Transactions mentioning the address. Servers accept exactly one.
    Mentions(Vec<Pubkey>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransactionLogsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSignatureSubscribeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_received_notification: Option<bool>,
}
