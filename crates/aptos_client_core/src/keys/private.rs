//! Private keys.
//!
//! Private keys never print their bytes through `Debug` or `Display`; the
//! only text form is the explicit AIP-80 string from `to_aip80`.

use core::fmt;

use ed25519_dalek::{Signer as _, SigningKey as DalekSigningKey};
use k256::{
    FieldBytes,
    ecdsa::{
        Signature as EcdsaSignature, SigningKey as EcdsaSigningKey, signature::DigestSigner as _,
    },
};
use rand::{CryptoRng, RngCore};
use sha3::{Digest as _, Sha3_256};

use super::{
    AnyPublicKey, AnySignature, Ed25519PublicKey, Ed25519Signature, KeyError, Secp256k1PublicKey,
    Secp256k1Signature, Signer, fixed_bytes,
};
use crate::primitives::decode_hex;

/// AIP-80 prefix for Ed25519 private keys.
const ED25519_AIP80_PREFIX: &str = "ed25519-priv-";

/// AIP-80 prefix for Secp256k1 private keys.
const SECP256K1_AIP80_PREFIX: &str = "secp256k1-priv-";

/// Decode hex or an AIP-80 string carrying `prefix`.
///
/// Plain hex is accepted for any scheme; an AIP-80 string for a different
/// scheme is not.
fn parse_aip80(input: &str, prefix: &'static str) -> Result<Vec<u8>, KeyError> {
    let trimmed = input.trim();
    if let Some(hex) = trimmed.strip_prefix(prefix) {
        return Ok(decode_hex(hex)?);
    }
    let foreign = [ED25519_AIP80_PREFIX, SECP256K1_AIP80_PREFIX]
        .iter()
        .any(|other| trimmed.starts_with(other));
    if foreign {
        return Err(KeyError::Aip80Prefix { expected: prefix });
    }
    Ok(decode_hex(trimmed)?)
}

/// An Ed25519 signing key.
#[derive(Clone)]
pub struct Ed25519PrivateKey(DalekSigningKey);

impl Ed25519PrivateKey {
    /// Key width in bytes.
    pub const LENGTH: usize = 32;

    /// A fresh random key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(DalekSigningKey::generate(rng))
    }

    /// Byte-exact construction from the 32-byte seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let seed: [u8; 32] = fixed_bytes("Ed25519PrivateKey", bytes)?;
        Ok(Self(DalekSigningKey::from_bytes(&seed)))
    }

    /// Parse hex or `ed25519-priv-0x...`.
    pub fn from_aip80(input: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&parse_aip80(input, ED25519_AIP80_PREFIX)?)
    }

    /// The 32-byte seed.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// `ed25519-priv-0x...`.
    #[must_use]
    pub fn to_aip80(&self) -> String {
        format!("{ED25519_AIP80_PREFIX}0x{}", hex::encode(self.to_bytes()))
    }

    /// The matching public key.
    #[must_use]
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey::from(self.0.verifying_key().to_bytes())
    }
}

impl Signer for Ed25519PrivateKey {
    type Signature = Ed25519Signature;

    fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature::from(self.0.sign(message).to_bytes())
    }
}

impl fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Ed25519PrivateKey").field(&"..").finish()
    }
}

impl PartialEq for Ed25519PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bytes() == other.0.to_bytes()
    }
}

impl Eq for Ed25519PrivateKey {}

/// A Secp256k1 ECDSA signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1PrivateKey(EcdsaSigningKey);

impl Secp256k1PrivateKey {
    /// Key width in bytes.
    pub const LENGTH: usize = 32;

    /// A fresh random key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(EcdsaSigningKey::random(rng))
    }

    /// Byte-exact construction; the scalar must be non-zero and below the
    /// group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let raw: [u8; 32] = fixed_bytes("Secp256k1PrivateKey", bytes)?;
        EcdsaSigningKey::from_bytes(&FieldBytes::from(raw))
            .map(Self)
            .map_err(|_err| KeyError::InvalidKey("Secp256k1PrivateKey"))
    }

    /// Parse hex or `secp256k1-priv-0x...`.
    pub fn from_aip80(input: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&parse_aip80(input, SECP256K1_AIP80_PREFIX)?)
    }

    /// The 32-byte big-endian scalar.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    /// `secp256k1-priv-0x...`.
    #[must_use]
    pub fn to_aip80(&self) -> String {
        format!("{SECP256K1_AIP80_PREFIX}0x{}", hex::encode(self.to_bytes()))
    }

    /// The matching uncompressed public key.
    #[must_use]
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey::from_verifying_key(self.0.verifying_key())
    }
}

impl Signer for Secp256k1PrivateKey {
    type Signature = Secp256k1Signature;

    /// RFC 6979 ECDSA over `SHA3-256(message)`, normalized to low `s`.
    fn sign(&self, message: &[u8]) -> Secp256k1Signature {
        let signed: EcdsaSignature = self.0.sign_digest(Sha3_256::new_with_prefix(message));
        let low_s = signed.normalize_s().unwrap_or(signed);
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&low_s.to_bytes());
        Secp256k1Signature::from(bytes)
    }
}

impl fmt::Debug for Secp256k1PrivateKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Secp256k1PrivateKey").field(&"..").finish()
    }
}

/// A private key of any signing scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrivateKey {
    /// Ed25519.
    Ed25519(Ed25519PrivateKey),
    /// Secp256k1 ECDSA.
    Secp256k1(Secp256k1PrivateKey),
}

impl PrivateKey {
    /// Parse an AIP-80 string, dispatching on its prefix.
    pub fn from_aip80(input: &str) -> Result<Self, KeyError> {
        let trimmed = input.trim();
        if trimmed.starts_with(SECP256K1_AIP80_PREFIX) {
            Secp256k1PrivateKey::from_aip80(trimmed).map(Self::Secp256k1)
        } else if trimmed.starts_with(ED25519_AIP80_PREFIX) {
            Ed25519PrivateKey::from_aip80(trimmed).map(Self::Ed25519)
        } else {
            Err(KeyError::Aip80Prefix {
                expected: ED25519_AIP80_PREFIX,
            })
        }
    }

    /// The AIP-80 string.
    #[must_use]
    pub fn to_aip80(&self) -> String {
        match self {
            Self::Ed25519(key) => key.to_aip80(),
            Self::Secp256k1(key) => key.to_aip80(),
        }
    }

    /// The SingleKey public key.
    #[must_use]
    pub fn public_key(&self) -> AnyPublicKey {
        match self {
            Self::Ed25519(key) => key.public_key().into(),
            Self::Secp256k1(key) => key.public_key().into(),
        }
    }
}

impl Signer for PrivateKey {
    type Signature = AnySignature;

    fn sign(&self, message: &[u8]) -> AnySignature {
        match self {
            Self::Ed25519(key) => key.sign(message).into(),
            Self::Secp256k1(key) => key.sign(message).into(),
        }
    }
}

impl From<Ed25519PrivateKey> for PrivateKey {
    fn from(key: Ed25519PrivateKey) -> Self {
        Self::Ed25519(key)
    }
}

impl From<Secp256k1PrivateKey> for PrivateKey {
    fn from(key: Secp256k1PrivateKey) -> Self {
        Self::Secp256k1(key)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::keys::Verifier as _;

    const ED25519_HEX: &str = "0x5d996aa76b3212142792d9130796cd2e11e3c445a93118c08414df4f66bc60ec";

    #[test]
    fn aip80_round_trip() {
        let key = Ed25519PrivateKey::from_aip80(ED25519_HEX).unwrap();
        let aip80 = key.to_aip80();
        assert_eq!(aip80, format!("ed25519-priv-{ED25519_HEX}"));
        assert_eq!(Ed25519PrivateKey::from_aip80(&aip80).unwrap(), key);
        assert_eq!(
            PrivateKey::from_aip80(&aip80).unwrap(),
            PrivateKey::Ed25519(key)
        );
    }

    /// An AIP-80 string is bound to its scheme.
    #[test]
    fn aip80_foreign_prefix_rejected() {
        let secp = format!("secp256k1-priv-{ED25519_HEX}");
        assert_eq!(
            Ed25519PrivateKey::from_aip80(&secp),
            Err(KeyError::Aip80Prefix {
                expected: "ed25519-priv-"
            })
        );
        assert!(matches!(
            PrivateKey::from_aip80(&secp),
            Ok(PrivateKey::Secp256k1(_))
        ));
        assert!(PrivateKey::from_aip80(ED25519_HEX).is_err());
    }

    #[test]
    fn debug_hides_key_material() {
        let key = Ed25519PrivateKey::from_aip80(ED25519_HEX).unwrap();
        assert_eq!(format!("{key:?}"), "Ed25519PrivateKey(\"..\")");
    }

    /// Zero and the group order are not valid scalars.
    #[test]
    fn secp256k1_scalar_range() {
        assert_eq!(
            Secp256k1PrivateKey::from_bytes(&[0u8; 32]),
            Err(KeyError::InvalidKey("Secp256k1PrivateKey"))
        );
        let order = hex::decode(concat!(
            "fffffffffffffffffffffffffffffffe",
            "baaedce6af48a03bbfd25e8cd0364141",
        ))
        .unwrap();
        assert_eq!(
            Secp256k1PrivateKey::from_bytes(&order),
            Err(KeyError::InvalidKey("Secp256k1PrivateKey"))
        );
    }

    /// Signatures are deterministic and always low-`s`.
    #[test]
    fn secp256k1_low_s_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..16 {
            let key = Secp256k1PrivateKey::generate(&mut rng);
            let sig = key.sign(b"low s");
            assert_eq!(sig, key.sign(b"low s"));
            let parsed = k256::ecdsa::Signature::from_slice(sig.as_bytes()).unwrap();
            assert!(parsed.normalize_s().is_none());
            assert!(key.public_key().verify(b"low s", &sig));
        }
    }

    /// The high-`s` twin of a valid signature is rejected.
    #[test]
    fn secp256k1_high_s_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let key = Secp256k1PrivateKey::generate(&mut rng);
        let sig = key.sign(b"twin");
        let parsed = k256::ecdsa::Signature::from_slice(sig.as_bytes()).unwrap();
        let (r, s) = parsed.split_scalars();
        let high = k256::ecdsa::Signature::from_scalars(r, -*s).unwrap();
        let high = Secp256k1Signature::from_bytes(&high.to_bytes()).unwrap();
        assert!(!key.public_key().verify(b"twin", &high));
    }

    #[test]
    fn secp256k1_aip80_round_trip() {
        let mut rng = StdRng::seed_from_u64(5);
        let key = Secp256k1PrivateKey::generate(&mut rng);
        let aip80 = key.to_aip80();
        assert!(aip80.starts_with("secp256k1-priv-0x"));
        assert_eq!(Secp256k1PrivateKey::from_aip80(&aip80).unwrap(), key);
    }
}
