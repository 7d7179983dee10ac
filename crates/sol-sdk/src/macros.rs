/// Shared plumbing for the fixed-width byte newtypes (`Pubkey`, `Hash`,
/// `Signature`): base58 `Display`/`FromStr`, base64 helpers, serde as a
/// base58 string, and strict `TryFrom<&[u8]>`.
macro_rules! impl_fixed_bytes {
    ($name:ident, $len:expr, $max_base58:expr, $err:expr) => {
        impl $name {
            pub const LEN: usize = $len;

            pub const fn new_from_array(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(&self) -> [u8; $len] {
                self.0
            }

            pub fn as_array(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_base58(&self) -> String {
                bs58::encode(&self.0).into_string()
            }

            pub fn from_base58(s: &str) -> Result<Self, $crate::error::SolError> {
                if s.len() > $max_base58 {
                    return Err(($err)(format!("base58 string too long: {} chars", s.len())));
                }
                let bytes = bs58::decode(s)
                    .into_vec()
                    .map_err(|e| ($err)(format!("bad base58: {e}")))?;
                Self::try_from(bytes.as_slice())
            }

            pub fn to_base64(&self) -> String {
                use base64::Engine as _;
                base64::engine::general_purpose::STANDARD.encode(self.0)
            }

            pub fn from_base64(s: &str) -> Result<Self, $crate::error::SolError> {
                use base64::Engine as _;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(|e| ($err)(format!("bad base64: {e}")))?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = $crate::error::SolError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                let arr: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| ($err)(format!("expected {} bytes, got {}", $len, bytes.len())))?;
                Ok(Self(arr))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_base58())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base58())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::SolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_base58(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base58())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
                Self::from_base58(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_fixed_bytes;
