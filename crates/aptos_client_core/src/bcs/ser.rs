//! Byte accumulator for canonical encoding.

use super::Encode;
use crate::primitives::U256;

/// Accumulates the canonical encoding of one value.
///
/// A serializer is built fresh for every value and consumed by
/// [`into_bytes`](Self::into_bytes); there is no reset.
#[derive(Clone, Debug, Default)]
pub struct Serializer {
    output: Vec<u8>,
}

impl Serializer {
    /// An empty serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// Consume the serializer, returning the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    /// Encode any [`Encode`] value.
    pub fn serialize<T: Encode + ?Sized>(&mut self, value: &T) {
        value.encode(self);
    }

    /// `0x00` or `0x01`.
    pub fn serialize_bool(&mut self, value: bool) {
        self.output.push(u8::from(value));
    }

    /// One raw byte.
    pub fn serialize_u8(&mut self, value: u8) {
        self.output.push(value);
    }

    /// Little-endian, 2 bytes.
    pub fn serialize_u16(&mut self, value: u16) {
        self.output.extend_from_slice(&value.to_le_bytes());
    }

    /// Little-endian, 4 bytes.
    pub fn serialize_u32(&mut self, value: u32) {
        self.output.extend_from_slice(&value.to_le_bytes());
    }

    /// Little-endian, 8 bytes.
    pub fn serialize_u64(&mut self, value: u64) {
        self.output.extend_from_slice(&value.to_le_bytes());
    }

    /// Little-endian, 16 bytes.
    pub fn serialize_u128(&mut self, value: u128) {
        self.output.extend_from_slice(&value.to_le_bytes());
    }

    /// Little-endian, 32 bytes.
    pub fn serialize_u256(&mut self, value: &U256) {
        self.output.extend_from_slice(value.as_le_bytes());
    }

    /// ULEB128: seven bits per byte, low group first, high bit set on every
    /// byte but the last.
    pub fn serialize_uleb128(&mut self, value: u32) {
        self.write_uleb128(u64::from(value));
    }

    /// ULEB128 length prefix for a sequence.
    #[expect(clippy::as_conversions, reason = "usize is at most 64 bits wide")]
    pub fn serialize_len(&mut self, len: usize) {
        self.write_uleb128(len as u64);
    }

    /// Enum variant index, ULEB128.
    pub fn serialize_variant(&mut self, index: u32) {
        self.serialize_uleb128(index);
    }

    /// Length-prefixed bytes.
    pub fn serialize_bytes(&mut self, bytes: &[u8]) {
        self.serialize_len(bytes.len());
        self.output.extend_from_slice(bytes);
    }

    /// Raw bytes with no length prefix; the decoder must know the width.
    pub fn serialize_fixed_bytes(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    /// UTF-8 bytes, length-prefixed.
    pub fn serialize_str(&mut self, value: &str) {
        self.serialize_bytes(value.as_bytes());
    }

    /// Element count followed by each element.
    pub fn serialize_vec<T: Encode>(&mut self, values: &[T]) {
        self.serialize_len(values.len());
        for value in values {
            value.encode(self);
        }
    }

    /// Presence flag followed by the value when present.
    pub fn serialize_option<T: Encode>(&mut self, value: Option<&T>) {
        match value {
            Some(inner) => {
                self.serialize_bool(true);
                inner.encode(self);
            }
            None => self.serialize_bool(false),
        }
    }

    fn write_uleb128(&mut self, mut value: u64) {
        while value >= 0x80 {
            let [low, ..] = value.to_le_bytes();
            self.output.push(low | 0x80);
            value >>= 7u8;
        }
        let [last, ..] = value.to_le_bytes();
        self.output.push(last);
    }
}
