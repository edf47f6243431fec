//! Unsigned 256-bit integers as Move sees them.

use core::{fmt, str::FromStr};

use num_bigint::BigUint;

use crate::bcs::{self, Decode, DecodeError, Encode};

/// Text that is not a non-negative integer below 2^256.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum U256ParseError {
    /// A leading minus sign.
    #[error("u256 cannot be negative: {0}")]
    Negative(String),
    /// Not a decimal or `0x` hex integer.
    #[error("not an unsigned integer: {0}")]
    Malformed(String),
    /// At least 2^256.
    #[error("value does not fit in 256 bits: {0}")]
    Overflow(String),
}

/// A 256-bit unsigned integer stored as 32 little-endian bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct U256([u8; 32]);

impl U256 {
    /// Zero.
    pub const ZERO: Self = Self([0u8; 32]);

    /// From 32 little-endian bytes.
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The 32 little-endian bytes.
    #[must_use]
    pub const fn as_le_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert from an arbitrary-precision integer.
    pub fn try_from_biguint(value: &BigUint) -> Option<Self> {
        if value.bits() > 256 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (slot, byte) in bytes.iter_mut().zip(value.to_bytes_le()) {
            *slot = byte;
        }
        Some(Self(bytes))
    }

    /// Widen to an arbitrary-precision integer.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0)
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self::from(u128::from(value))
    }
}

impl FromStr for U256 {
    type Err = U256ParseError;

    /// Decimal, or hex with a `0x` prefix.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.starts_with('-') {
            return Err(U256ParseError::Negative(input.to_owned()));
        }
        let parsed = match trimmed.strip_prefix("0x") {
            Some(digits) => BigUint::parse_bytes(digits.as_bytes(), 16),
            None => BigUint::parse_bytes(trimmed.as_bytes(), 10),
        };
        let value = parsed.ok_or_else(|| U256ParseError::Malformed(input.to_owned()))?;
        Self::try_from_biguint(&value).ok_or_else(|| U256ParseError::Overflow(input.to_owned()))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.to_biguint())
    }
}

impl Encode for U256 {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_u256(self);
    }
}

impl Decode for U256 {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_u256()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex() {
        let decimal: U256 = "340282366920938463463374607431768211456".parse().unwrap();
        let hex: U256 = "0x100000000000000000000000000000000".parse().unwrap();
        assert_eq!(decimal, hex);
        // 2^128 sets the low bit of byte 16
        assert_eq!(decimal.as_le_bytes()[16], 1);
        assert_eq!(decimal.to_string(), "340282366920938463463374607431768211456");
    }

    #[test]
    fn rejects_negative_and_overflow() {
        assert_eq!(
            "-1".parse::<U256>(),
            Err(U256ParseError::Negative("-1".to_owned()))
        );
        let too_big = format!("0x1{}", "0".repeat(64));
        assert_eq!(
            too_big.parse::<U256>(),
            Err(U256ParseError::Overflow(too_big.clone()))
        );
        assert_eq!(
            "12ab".parse::<U256>(),
            Err(U256ParseError::Malformed("12ab".to_owned()))
        );
    }

    #[test]
    fn max_fits() {
        let max = format!("0x{}", "f".repeat(64));
        let value: U256 = max.parse().unwrap();
        assert_eq!(value.as_le_bytes(), &[0xff; 32]);
        assert_eq!(bcs::to_bytes(&value), vec![0xff; 32]);
    }
}
