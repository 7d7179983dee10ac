//! Field adapters for integers the server may send as JSON strings.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => s
                .parse()
                .map_err(|_| E::custom(format!("expected a decimal u64 string, got {s:?}"))),
        }
    }
}

/// `u64` accepting either a JSON number or a decimal string.
pub mod u64_or_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        NumberOrString::deserialize(deserializer)?.into_u64()
    }
}

/// `Option<u64>` variant of [`u64_or_string`]; `null` and a missing field
/// (with `#[serde(default)]`) both give `None`.
pub mod option_u64_or_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Option::<NumberOrString>::deserialize(deserializer)?
            .map(NumberOrString::into_u64)
            .transpose()
    }
}

/// `Vec<u64>` whose elements may each be a number or a string.
pub mod vec_u64_or_string {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(values: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(v)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        Vec::<NumberOrString>::deserialize(deserializer)?
            .into_iter()
            .map(NumberOrString::into_u64)
            .collect()
    }
}
