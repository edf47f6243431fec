//! Keyless public keys and the identity commitment they carry.

use super::{
    KeylessError,
    poseidon::{hash_str_to_field, poseidon_hash, scalar_from_le_bytes, scalar_to_le_bytes},
};
use crate::{
    bcs::{self, Decode, DecodeError, Encode, decode_sized_bytes},
    constants::{
        ID_COMMITMENT_LENGTH, MAX_AUD_VAL_BYTES, MAX_UID_KEY_BYTES, MAX_UID_VAL_BYTES,
        PEPPER_LENGTH,
    },
    keys::{AnyPublicKey, AuthenticationKey, AuthenticationKeyScheme},
    primitives::AccountAddress,
};

/// `Poseidon(pepper, H(aud), H(uid_val), H(uid_key))` as 32 little-endian
/// bytes.
///
/// `uid_key` names the JWT claim identifying the user (usually `sub`) and
/// `uid_val` is its value. The pepper must be exactly 31 bytes.
pub fn compute_id_commitment(
    uid_key: &str,
    uid_val: &str,
    aud: &str,
    pepper: &[u8],
) -> Result<[u8; ID_COMMITMENT_LENGTH], KeylessError> {
    if pepper.len() != PEPPER_LENGTH {
        return Err(KeylessError::InvalidPepperLength(pepper.len()));
    }
    let fields = [
        scalar_from_le_bytes(pepper),
        hash_str_to_field(aud, MAX_AUD_VAL_BYTES)?,
        hash_str_to_field(uid_val, MAX_UID_VAL_BYTES)?,
        hash_str_to_field(uid_key, MAX_UID_KEY_BYTES)?,
    ];
    Ok(scalar_to_le_bytes(&poseidon_hash(&fields)?))
}

/// The issuer and identity commitment of a keyless account.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeylessPublicKey {
    iss: String,
    id_commitment: [u8; ID_COMMITMENT_LENGTH],
}

impl KeylessPublicKey {
    /// Wrap an already computed commitment.
    #[must_use]
    pub fn new(iss: impl Into<String>, id_commitment: [u8; ID_COMMITMENT_LENGTH]) -> Self {
        Self {
            iss: iss.into(),
            id_commitment,
        }
    }

    /// Commit to an identity; see [`compute_id_commitment`].
    pub fn from_claims(
        iss: impl Into<String>,
        uid_key: &str,
        uid_val: &str,
        aud: &str,
        pepper: &[u8],
    ) -> Result<Self, KeylessError> {
        let id_commitment = compute_id_commitment(uid_key, uid_val, aud, pepper)?;
        Ok(Self::new(iss, id_commitment))
    }

    /// The OIDC issuer.
    #[must_use]
    pub fn iss(&self) -> &str {
        &self.iss
    }

    /// The identity commitment.
    #[must_use]
    pub const fn id_commitment(&self) -> &[u8; ID_COMMITMENT_LENGTH] {
        &self.id_commitment
    }
}

impl AuthenticationKeyScheme for KeylessPublicKey {
    /// Keyless keys are always wrapped as a SingleKey.
    fn auth_key(&self) -> AuthenticationKey {
        AnyPublicKey::Keyless(self.clone()).auth_key()
    }
}

impl Encode for KeylessPublicKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_str(&self.iss);
        serializer.serialize_bytes(&self.id_commitment);
    }
}

impl Decode for KeylessPublicKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let iss = deserializer.deserialize_str()?;
        let id_commitment = decode_sized_bytes(deserializer, "KeylessPublicKey")?;
        Ok(Self { iss, id_commitment })
    }
}

/// A keyless key whose JWKs are published at an account rather than by the
/// framework.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FederatedKeylessPublicKey {
    jwk_address: AccountAddress,
    keyless: KeylessPublicKey,
}

impl FederatedKeylessPublicKey {
    /// Pair a keyless key with the address holding its issuer's JWKs.
    #[must_use]
    pub const fn new(jwk_address: AccountAddress, keyless: KeylessPublicKey) -> Self {
        Self {
            jwk_address,
            keyless,
        }
    }

    /// Where the issuer's JWKs live.
    #[must_use]
    pub const fn jwk_address(&self) -> &AccountAddress {
        &self.jwk_address
    }

    /// The wrapped keyless key.
    #[must_use]
    pub const fn keyless(&self) -> &KeylessPublicKey {
        &self.keyless
    }
}

impl AuthenticationKeyScheme for FederatedKeylessPublicKey {
    fn auth_key(&self) -> AuthenticationKey {
        AnyPublicKey::FederatedKeyless(self.clone()).auth_key()
    }
}

impl Encode for FederatedKeylessPublicKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.jwk_address.encode(serializer);
        self.keyless.encode(serializer);
    }
}

impl Decode for FederatedKeylessPublicKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            jwk_address: deserializer.deserialize()?,
            keyless: deserializer.deserialize()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pepper() -> Vec<u8> {
        (0u8..31).collect()
    }

    /// Fixed identity, fixed pepper, fixed commitment.
    #[test]
    fn id_commitment_vector() {
        let commitment =
            compute_id_commitment("sub", "test_user_123", "test-client-id", &pepper()).unwrap();
        assert_eq!(
            hex::encode(commitment),
            "ad4c76cd1e514b73f75ea114a11486a67ffd81797d5ec6b3543b8e07a3f8c325"
        );
    }

    #[test]
    fn pepper_must_be_31_bytes() {
        assert_eq!(
            compute_id_commitment("sub", "user", "aud", &[0u8; 32]),
            Err(KeylessError::InvalidPepperLength(32))
        );
    }

    /// Claims longer than their padded maximum are rejected, not truncated.
    #[test]
    fn oversized_claim() {
        let aud = "a".repeat(MAX_AUD_VAL_BYTES + 1);
        assert_eq!(
            compute_id_commitment("sub", "user", &aud, &pepper()),
            Err(KeylessError::InputTooLong {
                len: MAX_AUD_VAL_BYTES + 1,
                max: MAX_AUD_VAL_BYTES,
            })
        );
    }

    /// `iss` as a string, then the commitment as length-prefixed bytes.
    #[test]
    fn encoding_layout() {
        let key = KeylessPublicKey::new("https://accounts.google.com", [9u8; 32]);
        let bytes = key.to_bcs_bytes();
        assert_eq!(bytes[0] as usize, key.iss().len());
        assert_eq!(&bytes[1..28], key.iss().as_bytes());
        assert_eq!(bytes[28], 32);
        assert_eq!(&bytes[29..], &[9u8; 32]);
        assert_eq!(KeylessPublicKey::from_bcs_bytes(&bytes), Ok(key));

        let mut short = bytes;
        short[28] = 31;
        short.pop();
        assert!(matches!(
            KeylessPublicKey::from_bcs_bytes(&short),
            Err(DecodeError::InvalidLength { .. })
        ));
    }

    /// The federated wrapper changes the SingleKey tag and hence the
    /// address.
    #[test]
    fn federated_address_differs() {
        let key = KeylessPublicKey::new("https://issuer.example", [3u8; 32]);
        let federated = FederatedKeylessPublicKey::new(AccountAddress::A, key.clone());
        assert_ne!(key.account_address(), federated.account_address());

        let any = AnyPublicKey::from(federated.clone());
        let bytes = any.to_bcs_bytes();
        assert_eq!(bytes[0], 4);
        assert_eq!(&bytes[1..33], AccountAddress::A.as_bytes());
        assert_eq!(AnyPublicKey::from_bcs_bytes(&bytes), Ok(any));
    }
}
