//! Server-side filters for program-account queries.

use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// Longest byte string a memcmp filter may compare.
pub const MAX_MEMCMP_BYTES: usize = 128;
const MAX_MEMCMP_BASE58_LEN: usize = 175;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcFilterType {
    DataSize(u64),
    Memcmp(Memcmp),
}

impl RpcFilterType {
    pub fn verify(&self) -> Result<(), RpcError> {
        match self {
            Self::DataSize(_) => Ok(()),
            Self::Memcmp(memcmp) => memcmp.verify(),
        }
    }
}

/// Matches accounts whose data at `offset` equals `bytes` (base58).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Memcmp {
    pub offset: usize,
    pub bytes: String,
}

impl Memcmp {
    pub fn new(offset: usize, bytes: &[u8]) -> Self {
        Self {
            offset,
            bytes: bs58::encode(bytes).into_string(),
        }
    }

    pub fn verify(&self) -> Result<(), RpcError> {
        if self.bytes.len() > MAX_MEMCMP_BASE58_LEN {
            return Err(RpcError::LimitExceeded(format!(
                "memcmp filter is limited to {MAX_MEMCMP_BYTES} bytes"
            )));
        }
        let decoded = bs58::decode(&self.bytes)
            .into_vec()
            .map_err(|e| RpcError::InvalidConfig(format!("memcmp bytes are not base58: {e}")))?;
        if decoded.len() > MAX_MEMCMP_BYTES {
            return Err(RpcError::LimitExceeded(format!(
                "memcmp filter is limited to {MAX_MEMCMP_BYTES} bytes"
            )));
        }
        Ok(())
    }
}
