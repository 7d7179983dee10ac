//! The method catalog. Each call is a plain struct naming its server
//! method, its positional parameters and its typed result.

use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use sol_sdk::{Hash, Pubkey, Signature, Transaction, ValidationError, VersionedMessage};

use crate::error::RpcError;
use crate::types::*;

/// Largest address list `getRecentPrioritizationFees` accepts.
pub const MAX_PRIORITIZATION_FEE_ADDRESSES: usize = 128;
/// Largest signature list `getSignatureStatuses` accepts.
pub const MAX_SIGNATURE_STATUS_QUERY: usize = 256;

pub trait Call: Send + Sync {
    type Response: DeserializeOwned + Send;

    const METHOD: &'static str;

    fn params(&self) -> Result<Value, RpcError>;

    /// Where this call keeps its read commitment, if it takes one. Used to
    /// apply the client's default commitment.
    fn commitment_mut(&mut self) -> Option<&mut Option<CommitmentLevel>> {
        None
    }

    fn process_response(&self, value: Value) -> Result<Self::Response, RpcError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// `[args..., config]`, leaving the config out when it has no keys set.
fn positional<T: Serialize>(mut args: Vec<Value>, config: Option<&T>) -> Result<Value, RpcError> {
    if let Some(config) = config {
        let config = serde_json::to_value(config)?;
        if config.as_object().is_some_and(|keys| !keys.is_empty()) {
            args.push(config);
        }
    }
    Ok(Value::Array(args))
}

macro_rules! commitment_in_config {
    ($($field:ident).+) => {
        fn commitment_mut(&mut self) -> Option<&mut Option<CommitmentLevel>> {
            Some(&mut self.config.get_or_insert_with(Default::default).$($field).+)
        }
    };
}

macro_rules! no_params {
    ($name:ident, $method:literal, $response:ty) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Call for $name {
            type Response = $response;
            const METHOD: &'static str = $method;

            fn params(&self) -> Result<Value, RpcError> {
                Ok(json!([]))
            }
        }
    };
}

macro_rules! context_only {
    ($name:ident, $method:literal, $response:ty) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub config: Option<RpcContextConfig>,
        }

        impl Call for $name {
            type Response = $response;
            const METHOD: &'static str = $method;

            fn params(&self) -> Result<Value, RpcError> {
                positional(vec![], self.config.as_ref())
            }

            commitment_in_config!(commitment);
        }
    };
}

no_params!(GetGenesisHash, "getGenesisHash", Hash);
no_params!(GetHealth, "getHealth", String);
no_params!(GetVersion, "getVersion", RpcVersionInfo);

context_only!(GetBlockHeight, "getBlockHeight", u64);
context_only!(GetEpochInfo, "getEpochInfo", EpochInfo);
context_only!(GetLatestBlockhash, "getLatestBlockhash", RpcResponse<RpcBlockhash>);
context_only!(GetSlot, "getSlot", u64);

// ─── Accounts ───────────────────────────────────────────────────────

/// Account data is requested as base64 unless the config says otherwise;
/// the server's base58 default refuses accounts over 128 bytes.
fn base64_account_config() -> RpcAccountInfoConfig {
    RpcAccountInfoConfig {
        encoding: Some(UiAccountEncoding::Base64),
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAccountInfo {
    pub pubkey: Pubkey,
    pub config: Option<RpcAccountInfoConfig>,
}

impl GetAccountInfo {
    pub fn new(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            config: Some(base64_account_config()),
        }
    }
}

impl Call for GetAccountInfo {
    type Response = RpcResponse<Option<UiAccount>>;
    const METHOD: &'static str = "getAccountInfo";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.pubkey)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBalance {
    pub pubkey: Pubkey,
    pub config: Option<RpcContextConfig>,
}

impl GetBalance {
    pub fn new(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            config: None,
        }
    }
}

impl Call for GetBalance {
    type Response = RpcResponse<u64>;
    const METHOD: &'static str = "getBalance";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.pubkey)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMultipleAccounts {
    pub pubkeys: Vec<Pubkey>,
    pub config: Option<RpcAccountInfoConfig>,
}

impl GetMultipleAccounts {
    pub fn new(pubkeys: Vec<Pubkey>) -> Self {
        Self {
            pubkeys,
            config: Some(base64_account_config()),
        }
    }
}

impl Call for GetMultipleAccounts {
    type Response = RpcResponse<Vec<Option<UiAccount>>>;
    const METHOD: &'static str = "getMultipleAccounts";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.pubkeys)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetProgramAccounts {
    pub program_id: Pubkey,
    pub config: Option<RpcProgramAccountsConfig>,
}

impl GetProgramAccounts {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            config: Some(RpcProgramAccountsConfig {
                account_config: base64_account_config(),
                ..Default::default()
            }),
        }
    }

    pub fn with_filters(mut self, filters: Vec<RpcFilterType>) -> Self {
        self.config.get_or_insert_with(Default::default).filters = Some(filters);
        self
    }
}

impl Call for GetProgramAccounts {
    type Response = OptionalContext<Vec<RpcKeyedAccount>>;
    const METHOD: &'static str = "getProgramAccounts";

    fn params(&self) -> Result<Value, RpcError> {
        let filters = self.config.as_ref().and_then(|c| c.filters.as_deref());
        for filter in filters.unwrap_or_default() {
            filter.verify()?;
        }
        positional(vec![json!(self.program_id)], self.config.as_ref())
    }

    commitment_in_config!(account_config.commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMinimumBalanceForRentExemption {
    pub data_len: usize,
    pub config: Option<CommitmentConfig>,
}

impl GetMinimumBalanceForRentExemption {
    pub fn new(data_len: usize) -> Self {
        Self {
            data_len,
            config: None,
        }
    }
}

impl Call for GetMinimumBalanceForRentExemption {
    type Response = u64;
    const METHOD: &'static str = "getMinimumBalanceForRentExemption";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.data_len)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTokenAccountBalance {
    pub account: Pubkey,
    pub config: Option<CommitmentConfig>,
}

impl GetTokenAccountBalance {
    pub fn new(account: Pubkey) -> Self {
        Self {
            account,
            config: None,
        }
    }
}

impl Call for GetTokenAccountBalance {
    type Response = RpcResponse<UiTokenAmount>;
    const METHOD: &'static str = "getTokenAccountBalance";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.account)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

// ─── Blocks, fees, cluster ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBlock {
    pub slot: u64,
    pub config: Option<RpcBlockConfig>,
}

impl GetBlock {
    /// Full transactions, base64 encoded, v0 included.
    pub fn new(slot: u64) -> Self {
        Self {
            slot,
            config: Some(RpcBlockConfig {
                encoding: Some(UiTransactionEncoding::Base64),
                max_supported_transaction_version: Some(0),
                ..Default::default()
            }),
        }
    }
}

impl Call for GetBlock {
    type Response = UiConfirmedBlock;
    const METHOD: &'static str = "getBlock";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.slot)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFeeForMessage {
    pub message: VersionedMessage,
    pub config: Option<RpcContextConfig>,
}

impl GetFeeForMessage {
    pub fn new(message: VersionedMessage) -> Self {
        Self {
            message,
            config: None,
        }
    }
}

impl Call for GetFeeForMessage {
    type Response = RpcResponse<Option<u64>>;
    const METHOD: &'static str = "getFeeForMessage";

    fn params(&self) -> Result<Value, RpcError> {
        let message = base64::engine::general_purpose::STANDARD.encode(self.message.serialize()?);
        positional(vec![json!(message)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRecentPrioritizationFees {
    /// Writable accounts to scope the fees to. Empty means cluster-wide.
    pub addresses: Vec<Pubkey>,
}

impl Call for GetRecentPrioritizationFees {
    type Response = Vec<RpcPrioritizationFee>;
    const METHOD: &'static str = "getRecentPrioritizationFees";

    fn params(&self) -> Result<Value, RpcError> {
        if self.addresses.len() > MAX_PRIORITIZATION_FEE_ADDRESSES {
            return Err(RpcError::LimitExceeded(format!(
                "{} addresses, at most {MAX_PRIORITIZATION_FEE_ADDRESSES} allowed",
                self.addresses.len()
            )));
        }
        if self.addresses.is_empty() {
            Ok(json!([]))
        } else {
            Ok(json!([self.addresses]))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetVoteAccounts {
    pub config: Option<RpcGetVoteAccountsConfig>,
}

impl Call for GetVoteAccounts {
    type Response = RpcVoteAccountStatus;
    const METHOD: &'static str = "getVoteAccounts";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsBlockhashValid {
    pub blockhash: Hash,
    pub config: Option<RpcContextConfig>,
}

impl IsBlockhashValid {
    pub fn new(blockhash: Hash) -> Self {
        Self {
            blockhash,
            config: None,
        }
    }
}

impl Call for IsBlockhashValid {
    type Response = RpcResponse<bool>;
    const METHOD: &'static str = "isBlockhashValid";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.blockhash)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

// ─── Signatures and transactions ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSignatureStatuses {
    pub signatures: Vec<Signature>,
    pub config: Option<RpcSignatureStatusConfig>,
}

impl GetSignatureStatuses {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self {
            signatures,
            config: None,
        }
    }

    pub fn with_history(mut self) -> Self {
        self.config = Some(RpcSignatureStatusConfig {
            search_transaction_history: Some(true),
        });
        self
    }
}

impl Call for GetSignatureStatuses {
    type Response = RpcResponse<Vec<Option<TransactionStatus>>>;
    const METHOD: &'static str = "getSignatureStatuses";

    fn params(&self) -> Result<Value, RpcError> {
        if self.signatures.len() > MAX_SIGNATURE_STATUS_QUERY {
            return Err(RpcError::LimitExceeded(format!(
                "{} signatures, at most {MAX_SIGNATURE_STATUS_QUERY} allowed",
                self.signatures.len()
            )));
        }
        positional(vec![json!(self.signatures)], self.config.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSignaturesForAddress {
    pub address: Pubkey,
    pub config: Option<RpcSignaturesForAddressConfig>,
}

impl GetSignaturesForAddress {
    pub fn new(address: Pubkey) -> Self {
        Self {
            address,
            config: None,
        }
    }
}

impl Call for GetSignaturesForAddress {
    type Response = Vec<RpcConfirmedTransactionStatusWithSignature>;
    const METHOD: &'static str = "getSignaturesForAddress";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.address)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTransaction {
    pub signature: Signature,
    pub config: Option<RpcTransactionConfig>,
}

impl GetTransaction {
    /// Base64 encoded, v0 included.
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            config: Some(RpcTransactionConfig {
                encoding: Some(UiTransactionEncoding::Base64),
                commitment: None,
                max_supported_transaction_version: Some(0),
            }),
        }
    }
}

impl Call for GetTransaction {
    type Response = Option<EncodedConfirmedTransactionWithStatusMeta>;
    const METHOD: &'static str = "getTransaction";

    fn params(&self) -> Result<Value, RpcError> {
        positional(vec![json!(self.signature)], self.config.as_ref())
    }

    commitment_in_config!(commitment);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAirdrop {
    pub pubkey: Pubkey,
    pub lamports: u64,
    pub config: Option<RpcRequestAirdropConfig>,
}

impl RequestAirdrop {
    pub fn new(pubkey: Pubkey, lamports: u64) -> Self {
        Self {
            pubkey,
            lamports,
            config: None,
        }
    }
}

impl Call for RequestAirdrop {
    type Response = Signature;
    const METHOD: &'static str = "requestAirdrop";

    fn params(&self) -> Result<Value, RpcError> {
        positional(
            vec![json!(self.pubkey), json!(self.lamports)],
            self.config.as_ref(),
        )
    }

    commitment_in_config!(commitment);
}

/// Submits a fully signed transaction.
///
/// The transaction bytes are encoded with `config.encoding`, base64 when
/// unset, and the encoding is always named in the request so the server's
/// own base58 default never applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTransaction {
    pub transaction: Transaction,
    pub config: RpcSendTransactionConfig,
}

impl SendTransaction {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            config: RpcSendTransactionConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: TransactionEncoding) -> Self {
        self.config.encoding = Some(encoding);
        self
    }
}

impl Call for SendTransaction {
    type Response = Signature;
    const METHOD: &'static str = "sendTransaction";

    fn params(&self) -> Result<Value, RpcError> {
        if !self.transaction.is_signed() {
            return Err(ValidationError::NotFullySigned.into());
        }
        let encoding = self.config.encoding.unwrap_or_default();
        let wire = encoding.encode(&self.transaction.serialize()?);
        let config = RpcSendTransactionConfig {
            encoding: Some(encoding),
            ..self.config.clone()
        };
        positional(vec![json!(wire)], Some(&config))
    }

    fn commitment_mut(&mut self) -> Option<&mut Option<CommitmentLevel>> {
        Some(&mut self.config.preflight_commitment)
    }
}

/// Runs a transaction against the server's bank without committing it.
/// Signatures are not required unless `sig_verify` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulateTransaction {
    pub transaction: Transaction,
    pub config: RpcSimulateTransactionConfig,
}

impl SimulateTransaction {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            config: RpcSimulateTransactionConfig::default(),
        }
    }
}

impl Call for SimulateTransaction {
    type Response = RpcResponse<RpcSimulateTransactionResult>;
    const METHOD: &'static str = "simulateTransaction";

    fn params(&self) -> Result<Value, RpcError> {
        if self.config.sig_verify == Some(true) && self.config.replace_recent_blockhash == Some(true)
        {
            return Err(RpcError::InvalidConfig(
                "sig_verify and replace_recent_blockhash are mutually exclusive".into(),
            ));
        }
        let encoding = self.config.encoding.unwrap_or_default();
        let wire = encoding.encode(&self.transaction.serialize()?);
        let config = RpcSimulateTransactionConfig {
            encoding: Some(encoding),
            ..self.config.clone()
        };
        positional(vec![json!(wire)], Some(&config))
    }

    fn commitment_mut(&mut self) -> Option<&mut Option<CommitmentLevel>> {
        Some(&mut self.config.commitment)
    }
}
