//! Ephemeral key pairs: the short-lived Ed25519 keys keyless accounts sign
//! with, bound to a login through the OIDC nonce.

use rand::{CryptoRng, RngCore};

use super::{
    KeylessError,
    poseidon::{
        pad_and_pack_bytes_with_len, poseidon_hash, scalar_from_le_bytes, scalar_to_decimal,
    },
};
use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    constants::{EPK_BLINDER_LENGTH, EPK_DEFAULT_LIFETIME_SECS, MAX_COMMITED_EPK_BYTES},
    keys::{Ed25519PrivateKey, Ed25519PublicKey, Ed25519Signature, Signer as _, Verifier},
    primitives::now_secs,
};

/// Expiries are whole hours.
const SECS_PER_HOUR: u64 = 3600;

/// Public half of an ephemeral key pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EphemeralPublicKey {
    /// Tag 0.
    Ed25519(Ed25519PublicKey),
}

impl Verifier for EphemeralPublicKey {
    type Signature = EphemeralSignature;

    fn verify(&self, message: &[u8], signature: &EphemeralSignature) -> bool {
        match (self, signature) {
            (Self::Ed25519(key), EphemeralSignature::Ed25519(sig)) => key.verify(message, sig),
        }
    }
}

impl Encode for EphemeralPublicKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::Ed25519(key) => {
                serializer.serialize_variant(0);
                key.encode(serializer);
            }
        }
    }
}

impl Decode for EphemeralPublicKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Ed25519),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "EphemeralPublicKey",
                tag,
            }),
        }
    }
}

/// Signature by an ephemeral key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EphemeralSignature {
    /// Tag 0.
    Ed25519(Ed25519Signature),
}

impl Encode for EphemeralSignature {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::Ed25519(sig) => {
                serializer.serialize_variant(0);
                sig.encode(serializer);
            }
        }
    }
}

impl Decode for EphemeralSignature {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Ed25519),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "EphemeralSignature",
                tag,
            }),
        }
    }
}

/// An Ed25519 key with an expiry and a blinder, committed to by its nonce.
///
/// The nonce is computed once at construction:
///
/// $$\mathsf{nonce} = \text{Poseidon}(\text{pack}(\text{BCS}(\mathsf{epk}), 93)
///   \,\|\, \mathsf{exp} \,\|\, \mathsf{blinder})$$
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EphemeralKeyPair {
    private_key: Ed25519PrivateKey,
    public_key: EphemeralPublicKey,
    expiry_date_secs: u64,
    blinder: [u8; EPK_BLINDER_LENGTH],
    nonce: String,
}

impl EphemeralKeyPair {
    /// A fresh key and blinder expiring [`default_expiry`](Self::default_expiry)
    /// from now.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeylessError> {
        let private_key = Ed25519PrivateKey::generate(rng);
        let mut blinder = [0u8; EPK_BLINDER_LENGTH];
        rng.fill_bytes(&mut blinder);
        Self::new(private_key, Self::default_expiry(now_secs()), &blinder)
    }

    /// Assemble from parts; the blinder must be 31 bytes.
    pub fn new(
        private_key: Ed25519PrivateKey,
        expiry_date_secs: u64,
        blinder: &[u8],
    ) -> Result<Self, KeylessError> {
        let blinder_bytes: [u8; EPK_BLINDER_LENGTH] = blinder
            .try_into()
            .map_err(|_err| KeylessError::InvalidBlinderLength(blinder.len()))?;
        let public_key = EphemeralPublicKey::Ed25519(private_key.public_key());
        let nonce = compute_nonce(&public_key, expiry_date_secs, &blinder_bytes)?;
        Ok(Self {
            private_key,
            public_key,
            expiry_date_secs,
            blinder: blinder_bytes,
            nonce,
        })
    }

    /// Fourteen days after `now_secs`, rounded down to the hour.
    #[must_use]
    pub const fn default_expiry(now_secs: u64) -> u64 {
        let expiry = now_secs + EPK_DEFAULT_LIFETIME_SECS;
        expiry - expiry.rem_euclid(SECS_PER_HOUR)
    }

    /// The public key.
    #[must_use]
    pub const fn public_key(&self) -> &EphemeralPublicKey {
        &self.public_key
    }

    /// Expiry in seconds since the epoch.
    #[must_use]
    pub const fn expiry_date_secs(&self) -> u64 {
        self.expiry_date_secs
    }

    /// The blinder.
    #[must_use]
    pub const fn blinder(&self) -> &[u8; EPK_BLINDER_LENGTH] {
        &self.blinder
    }

    /// The decimal nonce to place in the OIDC request.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Whether `now_secs` is past the expiry.
    #[must_use]
    pub const fn is_expired_at(&self, now_secs: u64) -> bool {
        now_secs > self.expiry_date_secs
    }

    /// [`is_expired_at`](Self::is_expired_at) against the wall clock.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// Sign at a given time; fails once expired.
    pub fn sign_at(
        &self,
        message: &[u8],
        now_secs: u64,
    ) -> Result<EphemeralSignature, KeylessError> {
        if self.is_expired_at(now_secs) {
            return Err(KeylessError::EphemeralKeyExpired {
                expiry_date_secs: self.expiry_date_secs,
                now_secs,
            });
        }
        Ok(EphemeralSignature::Ed25519(self.private_key.sign(message)))
    }

    /// Sign now; fails once expired.
    pub fn sign(&self, message: &[u8]) -> Result<EphemeralSignature, KeylessError> {
        self.sign_at(message, now_secs())
    }
}

fn compute_nonce(
    public_key: &EphemeralPublicKey,
    expiry_date_secs: u64,
    blinder: &[u8; EPK_BLINDER_LENGTH],
) -> Result<String, KeylessError> {
    let epk_bytes = public_key.to_bcs_bytes();
    let mut fields = pad_and_pack_bytes_with_len(&epk_bytes, MAX_COMMITED_EPK_BYTES)?;
    fields.push(expiry_date_secs.into());
    fields.push(scalar_from_le_bytes(blinder));
    Ok(scalar_to_decimal(&poseidon_hash(&fields)?))
}
