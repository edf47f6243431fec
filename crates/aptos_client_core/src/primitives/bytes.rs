//! Byte buffers with a canonical `0x`-prefixed lowercase hex form.

use core::{fmt, str::FromStr};

use hex::FromHexError;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

/// Hex text that could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Odd number of hex digits.
    #[error("hex string has odd length: {0}")]
    OddLength(String),
    /// A character outside `[0-9a-fA-F]`.
    #[error("hex string contains invalid characters: {0}")]
    InvalidChars(String),
}

impl HexError {
    fn from_decode(input: &str, err: FromHexError) -> Self {
        match err {
            FromHexError::OddLength => Self::OddLength(input.to_owned()),
            FromHexError::InvalidHexCharacter { .. }
            | FromHexError::InvalidStringLength => Self::InvalidChars(input.to_owned()),
        }
    }
}

/// Strip an optional `0x` and decode.
pub(crate) fn decode_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits).map_err(|err| HexError::from_decode(input, err))
}

/// An immutable byte sequence whose text form is `0x` plus lowercase hex.
///
/// Equality is byte-wise: `"0xAB"` and `"ab"` parse to equal values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hex(Vec<u8>);

impl Hex {
    /// Parse hex text, with or without the `0x` prefix.
    pub fn from_hex_input(input: &str) -> Result<Self, HexError> {
        decode_hex(input).map(Self)
    }

    /// The raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Text without the `0x` prefix.
    #[must_use]
    pub fn to_string_without_prefix(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<Vec<u8>> for Hex {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Hex {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Hex {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for Hex {
    type Err = HexError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::from_hex_input(input)
    }
}

impl Serialize for Hex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex_input(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_optional_case_insensitive() {
        let upper = Hex::from_hex_input("0xABCD").unwrap();
        let bare = Hex::from_hex_input("abcd").unwrap();
        assert_eq!(upper, bare);
        assert_eq!(upper.to_string(), "0xabcd");
        assert_eq!(upper.to_string_without_prefix(), "abcd");
    }

    #[test]
    fn malformed_rejected() {
        assert_eq!(
            Hex::from_hex_input("0xabc"),
            Err(HexError::OddLength("0xabc".to_owned()))
        );
        assert_eq!(
            Hex::from_hex_input("zz"),
            Err(HexError::InvalidChars("zz".to_owned()))
        );
    }

    #[test]
    fn json_string_form() {
        let value = Hex::from(vec![0u8, 0xff]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"0x00ff\"");
        assert_eq!(serde_json::from_str::<Hex>(&json).unwrap(), value);
    }
}
