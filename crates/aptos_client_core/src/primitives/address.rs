//! 32-byte account addresses.
//!
//! Text forms follow AIP-40: special addresses (`0x0` through `0xf`, all
//! other bytes zero) print in short form; everything else prints as 64
//! lowercase hex digits.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::bcs::{self, Decode, DecodeError, Encode};

/// Address text that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// Strict parsing requires the `0x` prefix.
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    /// No hex digits after the prefix.
    #[error("address is empty: {0}")]
    TooShort(String),
    /// More than 64 hex digits.
    #[error("address has more than 64 hex digits: {0}")]
    TooLong(String),
    /// A character outside `[0-9a-fA-F]`.
    #[error("address contains invalid hex characters: {0}")]
    InvalidHexChars(String),
    /// A special address written with leading zeros, like `0x01`.
    #[error("special address must be written as 0x0 through 0xf: {0}")]
    InvalidPaddingZeroes(String),
    /// A non-special address written in short form.
    #[error("address must be 64 hex digits unless special: {0}")]
    LongFormRequired(String),
    /// A byte slice that is not 32 bytes long.
    #[error("address must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    /// Address width in bytes.
    pub const LENGTH: usize = 32;

    /// `0x0`, used as the fee payer placeholder.
    pub const ZERO: Self = Self::special(0);
    /// `0x1`, the framework.
    pub const ONE: Self = Self::special(1);
    /// `0x3`, the legacy token module.
    pub const THREE: Self = Self::special(3);
    /// `0x4`, the digital asset module.
    pub const FOUR: Self = Self::special(4);
    /// `0xa`, the APT fungible asset metadata object.
    pub const A: Self = Self::special(0x0a);

    const fn special(last: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = last;
        Self(bytes)
    }

    /// Wrap raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw bytes.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// All bytes zero except the last, which is below 16.
    #[must_use]
    pub fn is_special(&self) -> bool {
        let (head, last) = self.0.split_at(31);
        head.iter().all(|byte| *byte == 0) && last.first().is_some_and(|byte| *byte < 0x10)
    }

    /// `0x` followed by all 64 hex digits.
    #[must_use]
    pub fn to_string_long(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse AIP-40 text exactly: `0x` required, long form always allowed,
    /// short form only for special addresses and only as `0x0`..`0xf`.
    pub fn from_str_strict(input: &str) -> Result<Self, AddressParseError> {
        let Some(digits) = input.strip_prefix("0x") else {
            return Err(AddressParseError::MissingPrefix(input.to_owned()));
        };
        let address = Self::from_str_relaxed(input)?;
        if digits.len() == 64 {
            return Ok(address);
        }
        if !address.is_special() {
            return Err(AddressParseError::LongFormRequired(input.to_owned()));
        }
        if digits.len() == 1 {
            Ok(address)
        } else {
            Err(AddressParseError::InvalidPaddingZeroes(input.to_owned()))
        }
    }

    /// Parse leniently: optional `0x`, 1 to 64 hex digits, left-padded.
    pub fn from_str_relaxed(input: &str) -> Result<Self, AddressParseError> {
        let digits = input.strip_prefix("0x").unwrap_or(input);
        if digits.is_empty() {
            return Err(AddressParseError::TooShort(input.to_owned()));
        }
        if digits.len() > 64 {
            return Err(AddressParseError::TooLong(input.to_owned()));
        }
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(padded, &mut bytes)
            .map_err(|_err| AddressParseError::InvalidHexChars(input.to_owned()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 32]> for AccountAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<AccountAddress> for [u8; 32] {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}

impl TryFrom<&[u8]> for AccountAddress {
    type Error = AddressParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 32]>::try_from(bytes)
            .map(Self)
            .map_err(|_err| AddressParseError::InvalidLength(bytes.len()))
    }
}

impl AsRef<[u8]> for AccountAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = AddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::from_str_relaxed(input)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_special() {
            write!(formatter, "0x{:x}", self.0[31])
        } else {
            write!(formatter, "0x{}", hex::encode(self.0))
        }
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "AccountAddress({self})")
    }
}

impl Encode for AccountAddress {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_fixed_bytes(&self.0);
    }
}

impl Decode for AccountAddress {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_fixed_bytes().map(Self)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_str_relaxed(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn special_short_and_long() {
        let one = AccountAddress::from_str_relaxed("0x1").unwrap();
        assert_eq!(one, AccountAddress::ONE);
        assert_eq!(one.to_string(), "0x1");
        assert_eq!(one.to_string_long(), format!("0x{}1", "0".repeat(63)));
        assert_eq!(AccountAddress::A.to_string(), "0xa");
    }

    /// `0x10` is the first non-special address and prints long.
    #[test]
    fn first_non_special_prints_long() {
        let address = AccountAddress::from_str_relaxed("0x10").unwrap();
        assert!(!address.is_special());
        assert_eq!(address.to_string(), format!("0x{}10", "0".repeat(62)));
    }

    #[test]
    fn strict_parsing() {
        assert_eq!(AccountAddress::from_str_strict("0x1"), Ok(AccountAddress::ONE));
        assert_eq!(
            AccountAddress::from_str_strict(&AccountAddress::ONE.to_string_long()),
            Ok(AccountAddress::ONE)
        );
        assert_eq!(
            AccountAddress::from_str_strict("1"),
            Err(AddressParseError::MissingPrefix("1".to_owned()))
        );
        assert_eq!(
            AccountAddress::from_str_strict("0x01"),
            Err(AddressParseError::InvalidPaddingZeroes("0x01".to_owned()))
        );
        assert_eq!(
            AccountAddress::from_str_strict("0xca843279e3427144cead5e4d5999a3d0"),
            Err(AddressParseError::LongFormRequired(
                "0xca843279e3427144cead5e4d5999a3d0".to_owned()
            ))
        );
    }

    #[test]
    fn relaxed_parsing_errors() {
        assert_eq!(
            AccountAddress::from_str_relaxed("0x"),
            Err(AddressParseError::TooShort("0x".to_owned()))
        );
        let long = "1".repeat(65);
        assert_eq!(
            AccountAddress::from_str_relaxed(&long),
            Err(AddressParseError::TooLong(long.clone()))
        );
        assert_eq!(
            AccountAddress::from_str_relaxed("0xg"),
            Err(AddressParseError::InvalidHexChars("0xg".to_owned()))
        );
    }

    #[test]
    fn wrong_byte_length() {
        assert_eq!(
            AccountAddress::try_from(&[0u8; 31][..]),
            Err(AddressParseError::InvalidLength(31))
        );
    }

    proptest! {
        /// The printed form always parses strictly back to the same address.
        #[test]
        fn display_parses_strictly(bytes in any::<[u8; 32]>()) {
            let address = AccountAddress::new(bytes);
            let text = address.to_string();
            prop_assert_eq!(AccountAddress::from_str_strict(&text).unwrap(), address);
            prop_assert_eq!(bcs::to_bytes(&address), bytes.to_vec());
        }
    }
}
