//! Signature types that bridge private (sign) and public (verify) keys.

use core::cmp::Ordering;

use super::{KeyError, fixed_bytes};
use crate::{
    bcs::{self, Decode, DecodeError, Encode, decode_sized_bytes},
    keyless::KeylessSignature,
};

/// The Ed25519 group order $\ell = 2^{252} + 27742317777372353535851937790883648493$,
/// little-endian.
const CURVE_ORDER: [u8; 32] = [
    0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9, 0xde, 0x14,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
];

/// An Ed25519 signature $(R, S)$: 64 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    /// Signature width in bytes.
    pub const LENGTH: usize = 64;

    /// Byte-exact construction.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        fixed_bytes("Ed25519Signature", bytes).map(Self)
    }

    /// The raw bytes.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Whether $S < \ell$.
    ///
    /// A signature with $S \geq \ell$ is malleable: $S - \ell$ verifies
    /// too, so such signatures are rejected outright.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        let scalar_be = self.0.iter().skip(32).rev();
        for (byte, order) in scalar_be.zip(CURVE_ORDER.iter().rev()) {
            match byte.cmp(order) {
                Ordering::Less => return true,
                Ordering::Greater => return false,
                Ordering::Equal => {}
            }
        }
        false
    }
}

impl From<[u8; 64]> for Ed25519Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl From<Ed25519Signature> for [u8; 64] {
    fn from(sig: Ed25519Signature) -> Self {
        sig.0
    }
}

impl Encode for Ed25519Signature {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_bytes(&self.0);
    }
}

impl Decode for Ed25519Signature {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        decode_sized_bytes(deserializer, "Ed25519Signature").map(Self)
    }
}

/// A Secp256k1 ECDSA signature $(r, s)$: 64 bytes, big-endian halves.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Secp256k1Signature([u8; 64]);

impl Secp256k1Signature {
    /// Signature width in bytes.
    pub const LENGTH: usize = 64;

    /// Byte-exact construction.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        fixed_bytes("Secp256k1Signature", bytes).map(Self)
    }

    /// The raw bytes.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl From<[u8; 64]> for Secp256k1Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl Encode for Secp256k1Signature {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_bytes(&self.0);
    }
}

impl Decode for Secp256k1Signature {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        decode_sized_bytes(deserializer, "Secp256k1Signature").map(Self)
    }
}

impl_hex_text!(Ed25519Signature, Secp256k1Signature);

/// The SingleKey signature wrapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnySignature {
    /// Tag 0.
    Ed25519(Ed25519Signature),
    /// Tag 1.
    Secp256k1(Secp256k1Signature),
    /// Tag 3.
    Keyless(Box<KeylessSignature>),
}

impl AnySignature {
    /// The ULEB128 variant tag.
    #[must_use]
    pub const fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519(_) => 0,
            Self::Secp256k1(_) => 1,
            Self::Keyless(_) => 3,
        }
    }
}

impl From<Ed25519Signature> for AnySignature {
    fn from(sig: Ed25519Signature) -> Self {
        Self::Ed25519(sig)
    }
}

impl From<Secp256k1Signature> for AnySignature {
    fn from(sig: Secp256k1Signature) -> Self {
        Self::Secp256k1(sig)
    }
}

impl From<KeylessSignature> for AnySignature {
    fn from(sig: KeylessSignature) -> Self {
        Self::Keyless(Box::new(sig))
    }
}

impl Encode for AnySignature {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_variant(self.variant_index());
        match self {
            Self::Ed25519(sig) => sig.encode(serializer),
            Self::Secp256k1(sig) => sig.encode(serializer),
            Self::Keyless(sig) => sig.encode(serializer),
        }
    }
}

impl Decode for AnySignature {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Ed25519),
            1 => deserializer.deserialize().map(Self::Secp256k1),
            3 => deserializer.deserialize().map(Self::Keyless),
            // 2 is WebAuthn, which is not modelled
            tag => Err(DecodeError::UnknownVariant {
                type_name: "AnySignature",
                tag,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use curve25519_dalek::Scalar;
    use proptest::prelude::*;

    use super::*;
    use crate::keys::{Ed25519PrivateKey, Signer as _, Verifier as _};

    /// Add $\ell$ to the little-endian scalar in bytes 32..64.
    fn add_curve_order(sig: &Ed25519Signature) -> Ed25519Signature {
        let mut bytes = sig.to_bytes();
        let mut carry = 0u16;
        for (byte, order) in bytes.iter_mut().skip(32).zip(CURVE_ORDER) {
            let sum = u16::from(*byte) + u16::from(order) + carry;
            *byte = sum.to_le_bytes()[0];
            carry = sum >> 8;
        }
        Ed25519Signature(bytes)
    }

    /// Signature from the reference mnemonic's first account over
    /// `hello aptos`.
    #[test]
    fn ed25519_known_answer() {
        let key = Ed25519PrivateKey::from_bytes(
            &hex::decode("5d996aa76b3212142792d9130796cd2e11e3c445a93118c08414df4f66bc60ec")
                .unwrap(),
        )
        .unwrap();
        let sig = key.sign(b"hello aptos");
        assert_eq!(
            sig.to_string(),
            "0x7a373dd56df660b5de715e4d0a45c3e43a6e071ee50722b4aa10ab2e4aea808e\
             2441b437d4c0f9ce64432dd1b2fec15ae1668ab8ff7c051d964ac827fcb33609"
        );
        assert!(key.public_key().verify(b"hello aptos", &sig));
    }

    /// $S + \ell$ is the same point equation but a non-canonical encoding,
    /// and it must not verify.
    #[test]
    fn malleated_signature_rejected() {
        let key = Ed25519PrivateKey::from_bytes(&[7u8; 32]).unwrap();
        let sig = key.sign(b"malleable");
        let malleated = add_curve_order(&sig);

        assert!(sig.is_canonical());
        assert!(!malleated.is_canonical());
        assert!(key.public_key().verify(b"malleable", &sig));
        assert!(!key.public_key().verify(b"malleable", &malleated));
    }

    #[test]
    fn order_itself_is_not_canonical() {
        let mut bytes = [0u8; 64];
        bytes[32..].copy_from_slice(&CURVE_ORDER);
        assert!(!Ed25519Signature(bytes).is_canonical());
        bytes[32] -= 1;
        assert!(Ed25519Signature(bytes).is_canonical());
    }

    /// WebAuthn (tag 2) is an unsupported variant.
    #[test]
    fn webauthn_signature_unsupported() {
        let mut bytes = vec![0x02, 0x40];
        bytes.extend_from_slice(&[1u8; 64]);
        assert_eq!(
            AnySignature::from_bcs_bytes(&bytes),
            Err(DecodeError::UnknownVariant {
                type_name: "AnySignature",
                tag: 2,
            })
        );
    }

    proptest! {
        /// The canonical check agrees with curve25519-dalek's scalar parser.
        #[test]
        fn canonical_matches_dalek(s in any::<[u8; 32]>()) {
            let mut bytes = [0u8; 64];
            bytes[32..].copy_from_slice(&s);
            let dalek = bool::from(Scalar::from_canonical_bytes(s).is_some());
            prop_assert_eq!(Ed25519Signature(bytes).is_canonical(), dalek);
        }
    }
}
