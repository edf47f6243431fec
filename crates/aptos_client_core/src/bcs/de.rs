//! Cursor over canonical encodings.

use super::{Decode, DecodeError};
use crate::primitives::U256;

/// Reads canonical encodings from a borrowed buffer.
///
/// Every read either consumes exactly the bytes of one value or fails
/// without guessing; a short buffer is never padded.
#[derive(Clone, Debug)]
pub struct Deserializer<'de> {
    input: &'de [u8],
}

impl<'de> Deserializer<'de> {
    /// A cursor positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'de [u8]) -> Self {
        Self { input }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes(self.input.len()))
        }
    }

    /// Decode any [`Decode`] value.
    pub fn deserialize<T: Decode>(&mut self) -> Result<T, DecodeError> {
        T::decode(self)
    }

    fn take(&mut self, len: usize) -> Result<&'de [u8], DecodeError> {
        if len > self.input.len() {
            return Err(DecodeError::UnexpectedEnd {
                requested: len,
                remaining: self.input.len(),
            });
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// `0x00` or `0x01`; any other byte is an error.
    pub fn deserialize_bool(&mut self) -> Result<bool, DecodeError> {
        match self.deserialize_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    /// One raw byte.
    pub fn deserialize_u8(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.take_array::<1>()?;
        Ok(byte)
    }

    /// Little-endian, 2 bytes.
    pub fn deserialize_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Little-endian, 4 bytes.
    pub fn deserialize_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Little-endian, 8 bytes.
    pub fn deserialize_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Little-endian, 16 bytes.
    pub fn deserialize_u128(&mut self) -> Result<u128, DecodeError> {
        Ok(u128::from_le_bytes(self.take_array()?))
    }

    /// Little-endian, 32 bytes.
    pub fn deserialize_u256(&mut self) -> Result<U256, DecodeError> {
        Ok(U256::from_le_bytes(self.take_array()?))
    }

    /// ULEB128 constrained to the `u32` range.
    ///
    /// Rejects values above `u32::MAX` and encodings with a redundant
    /// trailing zero group, so every value has exactly one encoding.
    pub fn deserialize_uleb128(&mut self) -> Result<u32, DecodeError> {
        let mut value: u64 = 0;
        for shift in (0u32..35).step_by(7) {
            let byte = self.deserialize_u8()?;
            let digit = u64::from(byte & 0x7f);
            value |= digit << shift;
            if value > u64::from(u32::MAX) {
                return Err(DecodeError::Uleb128Overflow);
            }
            if byte & 0x80 == 0 {
                if shift > 0 && digit == 0 {
                    return Err(DecodeError::NonCanonicalUleb128);
                }
                return u32::try_from(value).map_err(|_err| DecodeError::Uleb128Overflow);
            }
        }
        Err(DecodeError::Uleb128Overflow)
    }

    /// ULEB128 sequence length.
    pub fn deserialize_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.deserialize_uleb128()?;
        usize::try_from(len).map_err(|_err| DecodeError::Uleb128Overflow)
    }

    /// Enum variant index.
    pub fn deserialize_variant(&mut self) -> Result<u32, DecodeError> {
        self.deserialize_uleb128()
    }

    /// Length-prefixed bytes.
    pub fn deserialize_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.deserialize_len()?;
        Ok(self.take(len)?.to_vec())
    }

    /// Exactly `N` raw bytes.
    pub fn deserialize_fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        self.take_array()
    }

    /// Length-prefixed UTF-8.
    pub fn deserialize_str(&mut self) -> Result<String, DecodeError> {
        String::from_utf8(self.deserialize_bytes()?).map_err(|_err| DecodeError::InvalidUtf8)
    }

    /// Element count followed by each element.
    pub fn deserialize_vec<T: Decode>(&mut self) -> Result<Vec<T>, DecodeError> {
        let len = self.deserialize_len()?;
        // Cap the preallocation by what the buffer could possibly hold.
        let mut out = Vec::with_capacity(len.min(self.input.len()));
        for _ in 0..len {
            out.push(T::decode(self)?);
        }
        Ok(out)
    }

    /// Presence flag followed by the value when present.
    pub fn deserialize_option<T: Decode>(&mut self) -> Result<Option<T>, DecodeError> {
        if self.deserialize_bool()? {
            Ok(Some(T::decode(self)?))
        } else {
            Ok(None)
        }
    }
}
