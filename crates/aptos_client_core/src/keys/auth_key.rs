//! ## Authentication keys
//!
//! $$\mathsf{auth\_key} = \text{SHA3-256}(\mathsf{bytes} \,\|\, \mathsf{scheme})$$
//!
//! An account's address is its original authentication key; rotating the
//! key later leaves the address unchanged.
//!
//! | scheme                          | byte   | hashed bytes           |
//! |---------------------------------|--------|------------------------|
//! | Ed25519 (legacy)                | `0x00` | raw 32-byte key        |
//! | MultiEd25519 (legacy)           | `0x01` | keys then threshold    |
//! | SingleKey                       | `0x02` | `BCS(AnyPublicKey)`    |
//! | MultiKey                        | `0x03` | `BCS(MultiKey)`        |
//! | DeriveObjectAddressFromObject   | `0xFC` | source ‖ derive-from   |
//! | DeriveObjectAddressFromSeed     | `0xFE` | creator ‖ seed         |
//! | DeriveResourceAccountAddress    | `0xFF` | creator ‖ seed         |

use core::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use sha3::{Digest as _, Sha3_256};

use super::KeyError;
use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    primitives::{AccountAddress, decode_hex},
};

/// The trailing scheme byte of an authentication key preimage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Scheme {
    /// Legacy single Ed25519 key.
    Ed25519 = 0x00,
    /// Legacy K-of-N Ed25519.
    MultiEd25519 = 0x01,
    /// One key of any scheme.
    SingleKey = 0x02,
    /// K-of-N keys of any scheme.
    MultiKey = 0x03,
    /// Object derived from another object.
    DeriveObjectAddressFromObject = 0xFC,
    /// Object derived from a creator and seed.
    DeriveObjectAddressFromSeed = 0xFE,
    /// Resource account derived from a creator and seed.
    DeriveResourceAccountAddress = 0xFF,
}

impl From<Scheme> for u8 {
    #[expect(clippy::as_conversions, reason = "fieldless enum with u8 discriminants")]
    fn from(scheme: Scheme) -> Self {
        scheme as Self
    }
}

/// A 32-byte authentication key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthenticationKey([u8; 32]);

impl AuthenticationKey {
    /// Key width in bytes.
    pub const LENGTH: usize = 32;

    /// $\text{SHA3-256}(\mathsf{bytes} \,\|\, \mathsf{scheme})$.
    #[must_use]
    pub fn from_scheme(scheme: Scheme, bytes: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(bytes);
        hasher.update([u8::from(scheme)]);
        Self(hasher.finalize().into())
    }

    /// Byte-exact construction.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        super::fixed_bytes("AuthenticationKey", bytes).map(Self)
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

    /// The address of an account created with this key.
    #[must_use]
    pub const fn account_address(&self) -> AccountAddress {
        AccountAddress::new(self.0)
    }
}

/// Anything that owns an authentication key: public keys, multi-keys and
/// the accounts built on them.
pub trait AuthenticationKeyScheme {
    /// The authentication key.
    fn auth_key(&self) -> AuthenticationKey;

    /// The address of an account created with [`auth_key`](Self::auth_key).
    fn account_address(&self) -> AccountAddress {
        self.auth_key().account_address()
    }
}

/// Address of an object created by `creator` from a seed:
/// `SHA3-256(creator || seed || 0xFE)`.
#[must_use]
pub fn create_object_address(creator: &AccountAddress, seed: &[u8]) -> AccountAddress {
    derive_address(Scheme::DeriveObjectAddressFromSeed, creator, seed)
}

/// Address of a resource account created by `creator` from a seed:
/// `SHA3-256(creator || seed || 0xFF)`.
#[must_use]
pub fn create_resource_address(creator: &AccountAddress, seed: &[u8]) -> AccountAddress {
    derive_address(Scheme::DeriveResourceAccountAddress, creator, seed)
}

/// Address of an object derived from another address:
/// `SHA3-256(source || derive_from || 0xFC)`.
#[must_use]
pub fn create_user_derived_object_address(
    source: &AccountAddress,
    derive_from: &AccountAddress,
) -> AccountAddress {
    derive_address(
        Scheme::DeriveObjectAddressFromObject,
        source,
        derive_from.as_bytes(),
    )
}

fn derive_address(scheme: Scheme, creator: &AccountAddress, seed: &[u8]) -> AccountAddress {
    let mut preimage = Vec::with_capacity(32 + seed.len());
    preimage.extend_from_slice(creator.as_bytes());
    preimage.extend_from_slice(seed);
    AuthenticationKey::from_scheme(scheme, &preimage).account_address()
}

impl From<[u8; 32]> for AuthenticationKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AuthenticationKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AuthenticationKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "AuthenticationKey({self})")
    }
}

impl FromStr for AuthenticationKey {
    type Err = KeyError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode_hex(input)?)
    }
}

impl Encode for AuthenticationKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_fixed_bytes(&self.0);
    }
}

impl Decode for AuthenticationKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        deserializer.deserialize_fixed_bytes().map(Self)
    }
}

impl Serialize for AuthenticationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuthenticationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scheme bytes are part of the preimage, so the same bytes under two
    /// schemes give two keys.
    #[test]
    fn scheme_separates_keys() {
        let bytes = [0x11u8; 32];
        assert_ne!(
            AuthenticationKey::from_scheme(Scheme::Ed25519, &bytes),
            AuthenticationKey::from_scheme(Scheme::SingleKey, &bytes)
        );
        let mut preimage = bytes.to_vec();
        preimage.push(0x02);
        let expected: [u8; 32] = Sha3_256::digest(&preimage).into();
        assert_eq!(
            AuthenticationKey::from_scheme(Scheme::SingleKey, &bytes).to_bytes(),
            expected
        );
    }

    /// Object and resource addresses differ only in the trailing scheme
    /// byte.
    #[test]
    fn object_and_resource_addresses() {
        let creator = AccountAddress::ONE;
        let object = create_object_address(&creator, b"seed");
        let resource = create_resource_address(&creator, b"seed");
        assert_ne!(object, resource);

        let mut preimage = creator.to_bytes().to_vec();
        preimage.extend_from_slice(b"seed");
        preimage.push(0xFE);
        let expected: [u8; 32] = Sha3_256::digest(&preimage).into();
        assert_eq!(object.to_bytes(), expected);
    }

    #[test]
    fn user_derived_object_address() {
        let source = AccountAddress::ONE;
        let derive_from = AccountAddress::A;
        let mut preimage = source.to_bytes().to_vec();
        preimage.extend_from_slice(derive_from.as_bytes());
        preimage.push(0xFC);
        let expected: [u8; 32] = Sha3_256::digest(&preimage).into();
        assert_eq!(
            create_user_derived_object_address(&source, &derive_from).to_bytes(),
            expected
        );
    }

    #[test]
    fn text_and_json() {
        let key = AuthenticationKey::from([0xabu8; 32]);
        let text = key.to_string();
        assert_eq!(text, format!("0x{}", "ab".repeat(32)));
        assert_eq!(text.parse::<AuthenticationKey>(), Ok(key));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(serde_json::from_str::<AuthenticationKey>(&json).unwrap(), key);
        assert!(matches!(
            "0xabcd".parse::<AuthenticationKey>(),
            Err(KeyError::InvalidLength { .. })
        ));
    }
}
