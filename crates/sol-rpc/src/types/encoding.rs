use serde::{Deserialize, Serialize};

/// Encoding requested for account data in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiAccountEncoding {
    Base58,
    Base64,
    #[serde(rename = "base64+zstd")]
    Base64Zstd,
    JsonParsed,
}

/// Encoding of transaction bytes sent to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionEncoding {
    /// Accepted by servers but deprecated.
    Base58,
    #[default]
    Base64,
}

impl TransactionEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        use base64::Engine as _;
        match self {
            Self::Base58 => bs58::encode(bytes).into_string(),
            Self::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Encoding requested for transactions in block and transaction responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiTransactionEncoding {
    Base58,
    Base64,
    Json,
    JsonParsed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionDetails {
    #[default]
    Full,
    Signatures,
    None,
    Accounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        let names = [
            (UiAccountEncoding::Base58, "\"base58\""),
            (UiAccountEncoding::Base64, "\"base64\""),
            (UiAccountEncoding::Base64Zstd, "\"base64+zstd\""),
            (UiAccountEncoding::JsonParsed, "\"jsonParsed\""),
        ];
        for (encoding, name) in names {
            assert_eq!(serde_json::to_string(&encoding).unwrap(), name);
            assert_eq!(serde_json::from_str::<UiAccountEncoding>(name).unwrap(), encoding);
        }
        assert_eq!(
            serde_json::to_string(&TransactionDetails::None).unwrap(),
            "\"none\""
        );
    }

    #[test]
    fn transaction_encoding_defaults_to_base64() {
        assert_eq!(TransactionEncoding::default(), TransactionEncoding::Base64);
        assert_eq!(TransactionEncoding::Base64.encode(&[0, 1, 2]), "AAEC");
        assert_eq!(TransactionEncoding::Base58.encode(&[0, 1, 2]), "15T");
    }
}
