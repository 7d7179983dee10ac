//! The subscription catalog. Each method pairs a `*Subscribe` call with its
//! `*Unsubscribe` and names the notification payload type.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sol_sdk::{Pubkey, Signature};

use crate::error::RpcError;
use crate::types::*;

pub trait SubscriptionMethod: Send + Sync {
    type Notification: DeserializeOwned + Send + 'static;

    const SUBSCRIBE: &'static str;
    const UNSUBSCRIBE: &'static str;

    fn params(&self) -> Result<Value, RpcError>;
}

fn with_config<T: serde::Serialize>(first: Value, config: &T) -> Result<Value, RpcError> {
    let config = serde_json::to_value(config)?;
    if config.as_object().is_some_and(|keys| !keys.is_empty()) {
        Ok(json!([first, config]))
    } else {
        Ok(json!([first]))
    }
}

/// Changes to one account's lamports or data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSubscribe {
    pub pubkey: Pubkey,
    pub config: RpcAccountInfoConfig,
}

impl AccountSubscribe {
    pub fn new(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
        }
    }
}

impl SubscriptionMethod for AccountSubscribe {
    type Notification = RpcResponse<UiAccount>;
    const SUBSCRIBE: &'static str = "accountSubscribe";
    const UNSUBSCRIBE: &'static str = "accountUnsubscribe";

    fn params(&self) -> Result<Value, RpcError> {
        with_config(json!(self.pubkey), &self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsSubscribe {
    pub filter: RpcTransactionLogsFilter,
    pub config: RpcTransactionLogsConfig,
}

impl LogsSubscribe {
    pub fn new(filter: RpcTransactionLogsFilter) -> Self {
        Self {
            filter,
            config: RpcTransactionLogsConfig::default(),
        }
    }
}

impl SubscriptionMethod for LogsSubscribe {
    type Notification = RpcResponse<RpcLogsResponse>;
    const SUBSCRIBE: &'static str = "logsSubscribe";
    const UNSUBSCRIBE: &'static str = "logsUnsubscribe";

    fn params(&self) -> Result<Value, RpcError> {
        if let RpcTransactionLogsFilter::Mentions(addresses) = &self.filter {
            if addresses.len() != 1 {
                return Err(RpcError::InvalidConfig(format!(
                    "logs filter takes exactly one address, got {}",
                    addresses.len()
                )));
            }
        }
        with_config(serde_json::to_value(&self.filter)?, &self.config)
    }
}

/// Changes to any account owned by a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSubscribe {
    pub program_id: Pubkey,
    pub config: RpcProgramAccountsConfig,
}

impl ProgramSubscribe {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            config: RpcProgramAccountsConfig {
                account_config: RpcAccountInfoConfig {
                    encoding: Some(UiAccountEncoding::Base64),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }
}

impl SubscriptionMethod for ProgramSubscribe {
    type Notification = RpcResponse<RpcKeyedAccount>;
    const SUBSCRIBE: &'static str = "programSubscribe";
    const UNSUBSCRIBE: &'static str = "programUnsubscribe";

    fn params(&self) -> Result<Value, RpcError> {
        for filter in self.config.filters.as_deref().unwrap_or_default() {
            filter.verify()?;
        }
        with_config(json!(self.program_id), &self.config)
    }
}

/// Fires once when the transaction reaches the requested commitment. The
/// server ends the subscription itself after that notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSubscribe {
    pub signature: Signature,
    pub config: RpcSignatureSubscribeConfig,
}

impl SignatureSubscribe {
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            config: RpcSignatureSubscribeConfig::default(),
        }
    }
}

impl SubscriptionMethod for SignatureSubscribe {
    type Notification = RpcResponse<RpcSignatureResult>;
    const SUBSCRIBE: &'static str = "signatureSubscribe";
    const UNSUBSCRIBE: &'static str = "signatureUnsubscribe";

    fn params(&self) -> Result<Value, RpcError> {
        with_config(json!(self.signature), &self.config)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotSubscribe;

impl SubscriptionMethod for SlotSubscribe {
    type Notification = SlotInfo;
    const SUBSCRIBE: &'static str = "slotSubscribe";
    const UNSUBSCRIBE: &'static str = "slotUnsubscribe";

    fn params(&self) -> Result<Value, RpcError> {
        Ok(json!([]))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootSubscribe;

impl SubscriptionMethod for RootSubscribe {
    type Notification = u64;
    const SUBSCRIBE: &'static str = "rootSubscribe";
    const UNSUBSCRIBE: &'static str = "rootUnsubscribe";

    fn params(&self) -> Result<Value, RpcError> {
        Ok(json!([]))
    }
}
