//! ## Binary Canonical Serialization
//!
//! BCS is the chain's deterministic binary format: every value has exactly
//! one encoding, so transaction hashes, signing messages and derived
//! addresses are reproducible byte for byte.
//!
//! | type            | encoding                                  |
//! |-----------------|-------------------------------------------|
//! | `bool`          | `0x00` / `0x01`                           |
//! | `u8`..`u256`    | little-endian, fixed width                |
//! | length, variant | ULEB128, at most `u32::MAX`               |
//! | `bytes`, `str`  | ULEB128 length then raw bytes             |
//! | `vector<T>`     | ULEB128 count then each element           |
//! | `option<T>`     | presence flag then the value when present |
//!
//! Types opt in through [`Encode`] and [`Decode`]. Encoding is infallible;
//! any value that exists can be written. Decoding is strict: truncated
//! input, non-canonical ULEB128, unknown variant tags and trailing bytes are
//! all errors.

mod de;
mod ser;

pub use de::Deserializer;
pub use ser::Serializer;

/// A value with a canonical encoding.
pub trait Encode {
    /// Append this value's encoding.
    fn encode(&self, serializer: &mut Serializer);

    /// The encoding as a fresh byte vector.
    fn to_bcs_bytes(&self) -> Vec<u8> {
        let mut serializer = Serializer::new();
        self.encode(&mut serializer);
        serializer.into_bytes()
    }
}

/// A value that can be read back from its canonical encoding.
pub trait Decode: Sized {
    /// Read one value from the cursor.
    fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError>;

    /// Decode a complete buffer; trailing bytes are an error.
    fn from_bcs_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut deserializer = Deserializer::new(bytes);
        let value = Self::decode(&mut deserializer)?;
        deserializer.finish()?;
        Ok(value)
    }
}

/// Encode `value` into a fresh buffer.
#[must_use]
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut serializer = Serializer::new();
    value.encode(&mut serializer);
    serializer.into_bytes()
}

/// Decode a complete buffer as `T`.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, DecodeError> {
    T::from_bcs_bytes(bytes)
}

/// Failures while reading an encoding.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes remained than the value needs.
    #[error("unexpected end of input: requested {requested} bytes, {remaining} remaining")]
    UnexpectedEnd {
        /// Bytes the read needed.
        requested: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A bool byte other than 0 or 1.
    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),

    /// A string payload was not UTF-8.
    #[error("string is not valid utf-8")]
    InvalidUtf8,

    /// A ULEB128 value exceeded `u32::MAX`.
    #[error("uleb128 value overflows u32")]
    Uleb128Overflow,

    /// A ULEB128 value had a redundant trailing zero group.
    #[error("non-canonical uleb128 encoding")]
    NonCanonicalUleb128,

    /// An enum tag with no matching variant.
    #[error("unknown variant {tag} for {type_name}")]
    UnknownVariant {
        /// The enum being decoded.
        type_name: &'static str,
        /// The tag read.
        tag: u32,
    },

    /// A length-prefixed payload had the wrong length for a fixed-size type.
    #[error("{type_name} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// The type being decoded.
        type_name: &'static str,
        /// Required length.
        expected: usize,
        /// Length found.
        actual: usize,
    },

    /// The bytes decoded but violate the type's invariants.
    #[error("invalid {type_name}: {reason}")]
    InvalidValue {
        /// The type being decoded.
        type_name: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// Bytes left over after a complete top-level value.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

impl DecodeError {
    /// Convenience for invariant failures surfaced by a constructor.
    pub(crate) fn invalid(type_name: &'static str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            type_name,
            reason: reason.to_string(),
        }
    }
}

/// Read a length-prefixed payload that must be exactly `N` bytes.
pub(crate) fn decode_sized_bytes<const N: usize>(
    deserializer: &mut Deserializer<'_>,
    type_name: &'static str,
) -> Result<[u8; N], DecodeError> {
    let bytes = deserializer.deserialize_bytes()?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_err| DecodeError::InvalidLength {
        type_name,
        expected: N,
        actual: bytes.len(),
    })
}

macro_rules! impl_scalar {
    ($($ty:ty => $ser:ident, $de:ident;)*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, serializer: &mut Serializer) {
                    serializer.$ser(*self);
                }
            }

            impl Decode for $ty {
                fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError> {
                    deserializer.$de()
                }
            }
        )*
    };
}

impl_scalar! {
    bool => serialize_bool, deserialize_bool;
    u8 => serialize_u8, deserialize_u8;
    u16 => serialize_u16, deserialize_u16;
    u32 => serialize_u32, deserialize_u32;
    u64 => serialize_u64, deserialize_u64;
    u128 => serialize_u128, deserialize_u128;
}

impl Encode for str {
    fn encode(&self, serializer: &mut Serializer) {
        serializer.serialize_str(self);
    }
}

impl Encode for String {
    fn encode(&self, serializer: &mut Serializer) {
        serializer.serialize_str(self);
    }
}

impl Decode for String {
    fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_str()
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, serializer: &mut Serializer) {
        serializer.serialize_vec(self);
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, serializer: &mut Serializer) {
        serializer.serialize_vec(self);
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_vec()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, serializer: &mut Serializer) {
        serializer.serialize_option(self.as_ref());
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_option()
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, serializer: &mut Serializer) {
        (**self).encode(serializer);
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, serializer: &mut Serializer) {
        (**self).encode(serializer);
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError> {
        T::decode(deserializer).map(Self::new)
    }
}

/// Fixed-size arrays encode as raw bytes with no length prefix.
impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, serializer: &mut Serializer) {
        serializer.serialize_fixed_bytes(self);
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(deserializer: &mut Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_fixed_bytes()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn uleb128_300() {
        let mut serializer = Serializer::new();
        serializer.serialize_uleb128(300);
        assert_eq!(serializer.into_bytes(), [0xac, 0x02]);
    }

    #[test]
    fn u64_42() {
        assert_eq!(to_bytes(&42u64), [0x2a, 0, 0, 0, 0, 0, 0, 0]);
    }

    /// The largest u32 takes five groups; one more bit overflows.
    #[test]
    fn uleb128_bounds() {
        let mut serializer = Serializer::new();
        serializer.serialize_uleb128(u32::MAX);
        let max = serializer.into_bytes();
        assert_eq!(max, [0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(Deserializer::new(&max).deserialize_uleb128(), Ok(u32::MAX));

        let over = [0xff, 0xff, 0xff, 0xff, 0x1f];
        assert_eq!(
            Deserializer::new(&over).deserialize_uleb128(),
            Err(DecodeError::Uleb128Overflow)
        );

        let too_long = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert_eq!(
            Deserializer::new(&too_long).deserialize_uleb128(),
            Err(DecodeError::Uleb128Overflow)
        );
    }

    /// `0x80 0x00` would also read as zero; only `0x00` is canonical.
    #[test]
    fn uleb128_rejects_redundant_zero_group() {
        assert_eq!(
            Deserializer::new(&[0x80, 0x00]).deserialize_uleb128(),
            Err(DecodeError::NonCanonicalUleb128)
        );
        assert_eq!(
            Deserializer::new(&[0xac, 0x82, 0x00]).deserialize_uleb128(),
            Err(DecodeError::NonCanonicalUleb128)
        );
    }

    #[test]
    fn truncated_input_reports_lengths() {
        let mut deserializer = Deserializer::new(&[1, 2, 3]);
        assert_eq!(
            deserializer.deserialize_u64(),
            Err(DecodeError::UnexpectedEnd {
                requested: 8,
                remaining: 3,
            })
        );

        // length prefix says 5, only 2 follow
        assert_eq!(
            from_bytes::<Vec<u8>>(&[5, 0xaa, 0xbb]),
            Err(DecodeError::UnexpectedEnd {
                requested: 1,
                remaining: 0,
            })
        );
        assert_eq!(
            from_bytes::<String>(&[5, b'a', b'b']),
            Err(DecodeError::UnexpectedEnd {
                requested: 5,
                remaining: 2,
            })
        );
    }

    #[test]
    fn bool_must_be_zero_or_one() {
        assert_eq!(from_bytes::<bool>(&[1]), Ok(true));
        assert_eq!(from_bytes::<bool>(&[2]), Err(DecodeError::InvalidBool(2)));
        assert_eq!(
            from_bytes::<Option<u8>>(&[7, 1]),
            Err(DecodeError::InvalidBool(7))
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        assert_eq!(from_bytes::<u8>(&[1, 2]), Err(DecodeError::TrailingBytes(1)));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert_eq!(
            from_bytes::<String>(&[2, 0xc3, 0x28]),
            Err(DecodeError::InvalidUtf8)
        );
    }

    proptest! {
        /// Our encoding agrees byte for byte with the reference `bcs` crate
        /// and reads back to the same value.
        #[test]
        fn matches_reference_encoder(
            flag in any::<bool>(),
            small in any::<u16>(),
            word in any::<u64>(),
            wide in any::<u128>(),
            text in ".{0,40}",
            list in prop::collection::vec(any::<u32>(), 0..300),
            maybe in prop::option::of(any::<u64>()),
        ) {
            let mut serializer = Serializer::new();
            serializer.serialize_bool(flag);
            serializer.serialize_u16(small);
            serializer.serialize_u64(word);
            serializer.serialize_u128(wide);
            serializer.serialize_str(&text);
            serializer.serialize_vec(&list);
            serializer.serialize_option(maybe.as_ref());
            let ours = serializer.into_bytes();

            let reference =
                ::bcs::to_bytes(&(flag, small, word, wide, &text, &list, maybe)).unwrap();
            prop_assert_eq!(&ours, &reference);

            let mut deserializer = Deserializer::new(&ours);
            prop_assert_eq!(deserializer.deserialize_bool().unwrap(), flag);
            prop_assert_eq!(deserializer.deserialize_u16().unwrap(), small);
            prop_assert_eq!(deserializer.deserialize_u64().unwrap(), word);
            prop_assert_eq!(deserializer.deserialize_u128().unwrap(), wide);
            prop_assert_eq!(deserializer.deserialize_str().unwrap(), text);
            prop_assert_eq!(deserializer.deserialize_vec::<u32>().unwrap(), list);
            prop_assert_eq!(deserializer.deserialize_option::<u64>().unwrap(), maybe);
            prop_assert!(deserializer.finish().is_ok());
        }

        /// Every u32 has exactly one ULEB128 encoding and it decodes back.
        #[test]
        fn uleb128_canonical(value in any::<u32>()) {
            let mut serializer = Serializer::new();
            serializer.serialize_uleb128(value);
            let bytes = serializer.into_bytes();
            let mut deserializer = Deserializer::new(&bytes);
            prop_assert_eq!(deserializer.deserialize_uleb128().unwrap(), value);
            prop_assert_eq!(deserializer.remaining(), 0);
        }
    }
}
