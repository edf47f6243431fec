//! Public keys: the concrete schemes and the SingleKey wrapper.

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey as DalekVerifyingKey};
use k256::ecdsa::{
    Signature as EcdsaSignature, VerifyingKey as EcdsaVerifyingKey,
    signature::DigestVerifier as _,
};
use sha3::{Digest as _, Sha3_256};
use tracing::debug;

use super::{
    AnySignature, Ed25519Signature, KeyError, Secp256k1Signature, Verifier,
    auth_key::{AuthenticationKey, AuthenticationKeyScheme, Scheme},
    fixed_bytes,
};
use crate::{
    bcs::{self, Decode, DecodeError, Encode, decode_sized_bytes},
    keyless::{FederatedKeylessPublicKey, KeylessPublicKey},
};

/// An Ed25519 public key: 32 bytes, compressed Edwards point.
///
/// Construction only checks the length. A key that does not decompress to a
/// valid point simply never verifies anything.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

impl Ed25519PublicKey {
    /// Key width in bytes.
    pub const LENGTH: usize = 32;

    /// Byte-exact construction.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        fixed_bytes("Ed25519PublicKey", bytes).map(Self)
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
}

impl From<[u8; 32]> for Ed25519PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Verifier for Ed25519PublicKey {
    type Signature = Ed25519Signature;

    /// Strict verification: non-canonical `S`, small-order keys and
    /// non-canonical points all fail.
    fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> bool {
        if !signature.is_canonical() {
            return false;
        }
        let Ok(key) = DalekVerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(signature.as_bytes());
        key.verify_strict(message, &sig).is_ok()
    }
}

impl AuthenticationKeyScheme for Ed25519PublicKey {
    /// The legacy scheme hashes the raw key, not its BCS encoding.
    fn auth_key(&self) -> AuthenticationKey {
        AuthenticationKey::from_scheme(Scheme::Ed25519, &self.0)
    }
}

impl Encode for Ed25519PublicKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_bytes(&self.0);
    }
}

impl Decode for Ed25519PublicKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        decode_sized_bytes(deserializer, "Ed25519PublicKey").map(Self)
    }
}

/// A Secp256k1 public key: 65-byte uncompressed SEC1 encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Secp256k1PublicKey([u8; 65]);

impl Secp256k1PublicKey {
    /// Key width in bytes.
    pub const LENGTH: usize = 65;

    /// Byte-exact construction; the bytes must be an uncompressed point on
    /// the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let raw: [u8; 65] = fixed_bytes("Secp256k1PublicKey", bytes)?;
        if raw.first() != Some(&0x04) || EcdsaVerifyingKey::from_sec1_bytes(&raw).is_err() {
            return Err(KeyError::InvalidKey("Secp256k1PublicKey"));
        }
        Ok(Self(raw))
    }

    pub(super) fn from_verifying_key(key: &EcdsaVerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut raw = [0u8; 65];
        raw.copy_from_slice(point.as_bytes());
        Self(raw)
    }

    /// The raw bytes.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 65] {
        self.0
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl Verifier for Secp256k1PublicKey {
    type Signature = Secp256k1Signature;

    /// ECDSA over `SHA3-256(message)`; high-`s` signatures are rejected.
    fn verify(&self, message: &[u8], signature: &Secp256k1Signature) -> bool {
        let Ok(key) = EcdsaVerifyingKey::from_sec1_bytes(&self.0) else {
            return false;
        };
        let Ok(sig) = EcdsaSignature::from_slice(signature.as_bytes()) else {
            return false;
        };
        // normalize_s only yields a value when s was in the high half
        if sig.normalize_s().is_some() {
            return false;
        }
        key.verify_digest(Sha3_256::new_with_prefix(message), &sig).is_ok()
    }
}

impl Encode for Secp256k1PublicKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_bytes(&self.0);
    }
}

impl Decode for Secp256k1PublicKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let raw: [u8; 65] = decode_sized_bytes(deserializer, "Secp256k1PublicKey")?;
        Self::from_bytes(&raw).map_err(|err| DecodeError::invalid("Secp256k1PublicKey", err))
    }
}

/// The SingleKey wrapper: exactly one public key, tagged by scheme.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnyPublicKey {
    /// Tag 0.
    Ed25519(Ed25519PublicKey),
    /// Tag 1.
    Secp256k1(Secp256k1PublicKey),
    /// Tag 3.
    Keyless(KeylessPublicKey),
    /// Tag 4.
    FederatedKeyless(FederatedKeylessPublicKey),
}

impl AnyPublicKey {
    /// The ULEB128 variant tag.
    #[must_use]
    pub const fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519(_) => 0,
            Self::Secp256k1(_) => 1,
            Self::Keyless(_) => 3,
            Self::FederatedKeyless(_) => 4,
        }
    }
}

impl Verifier for AnyPublicKey {
    type Signature = AnySignature;

    /// Scheme mismatches are `false`. Keyless signatures need the on-chain
    /// Groth16 verifier and JWK set, so they are never accepted here.
    fn verify(&self, message: &[u8], signature: &AnySignature) -> bool {
        match (self, signature) {
            (Self::Ed25519(key), AnySignature::Ed25519(sig)) => key.verify(message, sig),
            (Self::Secp256k1(key), AnySignature::Secp256k1(sig)) => key.verify(message, sig),
            (Self::Keyless(_) | Self::FederatedKeyless(_), AnySignature::Keyless(_)) => {
                debug!("keyless signature cannot be verified offline");
                false
            }
            (Self::Ed25519(_), AnySignature::Secp256k1(_) | AnySignature::Keyless(_))
            | (Self::Secp256k1(_), AnySignature::Ed25519(_) | AnySignature::Keyless(_))
            | (
                Self::Keyless(_) | Self::FederatedKeyless(_),
                AnySignature::Ed25519(_) | AnySignature::Secp256k1(_),
            ) => false,
        }
    }
}

impl AuthenticationKeyScheme for AnyPublicKey {
    fn auth_key(&self) -> AuthenticationKey {
        AuthenticationKey::from_scheme(Scheme::SingleKey, &self.to_bcs_bytes())
    }
}

impl From<Ed25519PublicKey> for AnyPublicKey {
    fn from(key: Ed25519PublicKey) -> Self {
        Self::Ed25519(key)
    }
}

impl From<Secp256k1PublicKey> for AnyPublicKey {
    fn from(key: Secp256k1PublicKey) -> Self {
        Self::Secp256k1(key)
    }
}

impl From<KeylessPublicKey> for AnyPublicKey {
    fn from(key: KeylessPublicKey) -> Self {
        Self::Keyless(key)
    }
}

impl From<FederatedKeylessPublicKey> for AnyPublicKey {
    fn from(key: FederatedKeylessPublicKey) -> Self {
        Self::FederatedKeyless(key)
    }
}

impl Encode for AnyPublicKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_variant(self.variant_index());
        match self {
            Self::Ed25519(key) => key.encode(serializer),
            Self::Secp256k1(key) => key.encode(serializer),
            Self::Keyless(key) => key.encode(serializer),
            Self::FederatedKeyless(key) => key.encode(serializer),
        }
    }
}

impl Decode for AnyPublicKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Ed25519),
            1 => deserializer.deserialize().map(Self::Secp256k1),
            3 => deserializer.deserialize().map(Self::Keyless),
            4 => deserializer.deserialize().map(Self::FederatedKeyless),
            // 2 is Secp256r1, which is not modelled
            tag => Err(DecodeError::UnknownVariant {
                type_name: "AnyPublicKey",
                tag,
            }),
        }
    }
}

impl_hex_text!(Ed25519PublicKey, Secp256k1PublicKey);

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::keys::{Ed25519PrivateKey, Secp256k1PrivateKey, Signer as _};

    /// The public key of the first account derived from the reference
    /// mnemonic.
    const ED25519_KEY: &str = "0xea526ba1710343d953461ff68641f1b7df5f23b9042ffa2d2a798d3adb3f3d6c";

    #[test]
    fn ed25519_text_and_length() {
        let key: Ed25519PublicKey = ED25519_KEY.parse().unwrap();
        assert_eq!(key.to_string(), ED25519_KEY);
        assert_eq!(
            Ed25519PublicKey::from_bytes(&[0u8; 31]),
            Err(KeyError::length("Ed25519PublicKey", 32, 31))
        );
    }

    /// A compressed SEC1 point is the wrong length; garbage of the right
    /// length is not a point.
    #[test]
    fn secp256k1_requires_uncompressed_point() {
        let mut rng = StdRng::seed_from_u64(1);
        let key = Secp256k1PrivateKey::generate(&mut rng).public_key();
        assert_eq!(key.as_bytes()[0], 0x04);
        assert_eq!(Secp256k1PublicKey::from_bytes(key.as_bytes()), Ok(key));
        assert!(matches!(
            Secp256k1PublicKey::from_bytes(&key.as_bytes()[..33]),
            Err(KeyError::InvalidLength { .. })
        ));
        let mut not_on_curve = key.to_bytes();
        not_on_curve[64] ^= 1;
        assert_eq!(
            Secp256k1PublicKey::from_bytes(&not_on_curve),
            Err(KeyError::InvalidKey("Secp256k1PublicKey"))
        );
    }

    /// SingleKey encoding is the ULEB128 tag followed by length-prefixed
    /// key bytes.
    #[test]
    fn any_public_key_layout() {
        let key: Ed25519PublicKey = ED25519_KEY.parse().unwrap();
        let bytes = AnyPublicKey::from(key).to_bcs_bytes();
        assert_eq!(&bytes[..2], &[0x00, 0x20]);
        assert_eq!(&bytes[2..], key.as_bytes());
        assert_eq!(
            AnyPublicKey::from_bcs_bytes(&bytes),
            Ok(AnyPublicKey::Ed25519(key))
        );
    }

    /// Secp256r1 (tag 2) and unknown tags are unsupported variants.
    #[test]
    fn unsupported_public_key_tags() {
        for tag in [2u8, 5] {
            let mut bytes = vec![tag, 0x20];
            bytes.extend_from_slice(&[7u8; 32]);
            assert_eq!(
                AnyPublicKey::from_bcs_bytes(&bytes),
                Err(DecodeError::UnknownVariant {
                    type_name: "AnyPublicKey",
                    tag: u32::from(tag),
                })
            );
        }
    }

    /// Legacy and SingleKey wrappings of the same Ed25519 key live at
    /// different addresses.
    #[test]
    fn legacy_and_single_key_addresses() {
        let key: Ed25519PublicKey = ED25519_KEY.parse().unwrap();
        assert_eq!(
            key.auth_key().account_address().to_string(),
            "0x07968dab936c1bad187c60ce4082f307d030d780e91e694ae03aef16aba73f30"
        );
        assert_eq!(
            AnyPublicKey::from(key).auth_key().account_address().to_string(),
            "0x28b829b524d7c24aa7fd8916573c814df766dae542f724e1cf8914536232c346"
        );
    }

    #[test]
    fn ed25519_rejects_wrong_key() {
        let mut rng = StdRng::seed_from_u64(2);
        let signer = Ed25519PrivateKey::generate(&mut rng);
        let other = Ed25519PrivateKey::generate(&mut rng);
        let sig = signer.sign(b"message");
        assert!(signer.public_key().verify(b"message", &sig));
        assert!(!other.public_key().verify(b"message", &sig));
    }
}
