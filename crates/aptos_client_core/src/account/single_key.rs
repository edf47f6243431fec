//! Accounts backed by one private key.

use rand::{CryptoRng, RngCore};

use super::{AccountSigner, SigningError};
use crate::{
    keys::{
        AnyPublicKey, AuthenticationKey, AuthenticationKeyScheme as _, Ed25519PrivateKey,
        Ed25519PublicKey, PrivateKey, Secp256k1PrivateKey, Signer as _,
        derivation::{derive_ed25519, derive_secp256k1},
    },
    primitives::AccountAddress,
    transaction::AccountAuthenticator,
};

/// A legacy Ed25519 account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ed25519Account {
    private_key: Ed25519PrivateKey,
    address: AccountAddress,
}

impl Ed25519Account {
    /// An account at the key's own address.
    #[must_use]
    pub fn new(private_key: Ed25519PrivateKey) -> Self {
        let address = private_key.public_key().account_address();
        Self {
            private_key,
            address,
        }
    }

    /// An account whose key was rotated away from its original address.
    #[must_use]
    pub const fn with_address(private_key: Ed25519PrivateKey, address: AccountAddress) -> Self {
        Self {
            private_key,
            address,
        }
    }

    /// A fresh random account.
    #[must_use]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(Ed25519PrivateKey::generate(rng))
    }

    /// Derive along a hardened path such as `m/44'/637'/0'/0'/0'`.
    pub fn from_derivation_path(path: &str, mnemonic: &str) -> Result<Self, SigningError> {
        Ok(Self::new(derive_ed25519(path, mnemonic)?))
    }

    /// The private key.
    #[must_use]
    pub const fn private_key(&self) -> &Ed25519PrivateKey {
        &self.private_key
    }

    /// The public key.
    #[must_use]
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.private_key.public_key()
    }
}

impl AccountSigner for Ed25519Account {
    fn address(&self) -> AccountAddress {
        self.address
    }

    fn auth_key(&self) -> AuthenticationKey {
        self.public_key().auth_key()
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, SigningError> {
        Ok(AccountAuthenticator::Ed25519 {
            public_key: self.public_key(),
            signature: self.private_key.sign(message),
        })
    }
}

/// A SingleKey account: Ed25519 or Secp256k1 under the unified scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleKeyAccount {
    private_key: PrivateKey,
    address: AccountAddress,
}

impl SingleKeyAccount {
    /// An account at the key's own address.
    #[must_use]
    pub fn new(private_key: PrivateKey) -> Self {
        let address = private_key.public_key().account_address();
        Self {
            private_key,
            address,
        }
    }

    /// An account whose key was rotated away from its original address.
    #[must_use]
    pub const fn with_address(private_key: PrivateKey, address: AccountAddress) -> Self {
        Self {
            private_key,
            address,
        }
    }

    /// A fresh random Ed25519 account.
    #[must_use]
    pub fn generate_ed25519<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(Ed25519PrivateKey::generate(rng).into())
    }

    /// A fresh random Secp256k1 account.
    #[must_use]
    pub fn generate_secp256k1<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(Secp256k1PrivateKey::generate(rng).into())
    }

    /// Ed25519 along a hardened path such as `m/44'/637'/0'/0'/0'`.
    pub fn from_ed25519_path(path: &str, mnemonic: &str) -> Result<Self, SigningError> {
        Ok(Self::new(derive_ed25519(path, mnemonic)?.into()))
    }

    /// Secp256k1 along a BIP44 path such as `m/44'/637'/0'/0/0`.
    pub fn from_secp256k1_path(path: &str, mnemonic: &str) -> Result<Self, SigningError> {
        Ok(Self::new(derive_secp256k1(path, mnemonic)?.into()))
    }

    /// The private key.
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The SingleKey public key.
    #[must_use]
    pub fn public_key(&self) -> AnyPublicKey {
        self.private_key.public_key()
    }
}

impl AccountSigner for SingleKeyAccount {
    fn address(&self) -> AccountAddress {
        self.address
    }

    fn auth_key(&self) -> AuthenticationKey {
        self.public_key().auth_key()
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, SigningError> {
        Ok(AccountAuthenticator::SingleKey {
            public_key: self.public_key(),
            signature: self.private_key.sign(message),
        })
    }
}
