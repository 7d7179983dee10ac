use serde::{Deserialize, Serialize};

/// Freshness class requested for reads. Servers default to `finalized`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    Processed,
    Confirmed,
    #[default]
    Finalized,
}

impl std::fmt::Display for CommitmentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        })
    }
}

/// Stand-alone `{"commitment": ...}` object for methods that take nothing
/// else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentLevel>,
}

impl CommitmentConfig {
    pub fn new(commitment: CommitmentLevel) -> Self {
        Self {
            commitment: Some(commitment),
        }
    }
}
