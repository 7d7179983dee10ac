//! Encoded opaque byte blobs in JSON responses.
//!
//! The wire form is `[payload, encoding]`. A bare string is legacy base58.
//! `base64+zstd` payloads are decompressed on decode and re-encoded as
//! plain base64.

use std::io::Read;

use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest decompressed payload accepted, the runtime's account data limit.
pub const MAX_DECODED_LEN: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataEncoding {
    Base58,
    Base64,
}

impl DataEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base58 => "base58",
            Self::Base64 => "base64",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolData {
    pub bytes: Vec<u8>,
    pub encoding: DataEncoding,
}

impl SolData {
    pub fn base58(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: DataEncoding::Base58,
        }
    }

    pub fn base64(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: DataEncoding::Base64,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn encoded(&self) -> String {
        match self.encoding {
            DataEncoding::Base58 => bs58::encode(&self.bytes).into_string(),
            DataEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        }
    }

    /// Decodes `payload` tagged with `encoding` as the server names it.
    pub fn decode(payload: &str, encoding: &str) -> Result<Self, String> {
        match encoding {
            "base58" => bs58::decode(payload)
                .into_vec()
                .map(Self::base58)
                .map_err(|e| format!("invalid base58 payload: {e}")),
            "base64" => decode_base64(payload).map(Self::base64),
            "base64+zstd" => {
                let compressed = decode_base64(payload)?;
                decompress(&compressed).map(Self::base64)
            }
            other => Err(format!("unsupported data encoding {other:?}")),
        }
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, String> {
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64 payload: {e}"))
}

fn decompress(compressed: &[u8]) -> Result<Vec<u8>, String> {
    let decoder = zstd::stream::read::Decoder::new(compressed)
        .map_err(|e| format!("invalid zstd payload: {e}"))?;
    let mut out = Vec::new();
    decoder
        .take(MAX_DECODED_LEN as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| format!("invalid zstd payload: {e}"))?;
    if out.len() > MAX_DECODED_LEN {
        return Err(format!(
            "decompressed payload exceeds {MAX_DECODED_LEN} bytes"
        ));
    }
    Ok(out)
}

impl Serialize for SolData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.encoded(), self.encoding.as_str()).serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
    Tagged(String, String),
    Legacy(String),
}

impl<'de> Deserialize<'de> for SolData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Wire::deserialize(deserializer)? {
            Wire::Tagged(payload, encoding) => SolData::decode(&payload, &encoding),
            Wire::Legacy(payload) => SolData::decode(&payload, "base58"),
        }
        .map_err(D::Error::custom)
    }
}
