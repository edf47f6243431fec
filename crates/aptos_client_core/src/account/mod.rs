//! ## Accounts
//!
//! An account owns signing material and knows its on-chain address. Each
//! scheme produces a different [`AccountAuthenticator`]:
//!
//! | account              | authenticator                  | signs                         |
//! |----------------------|--------------------------------|-------------------------------|
//! | [`Ed25519Account`]   | `Ed25519`                      | raw signing message           |
//! | [`SingleKeyAccount`] | `SingleKey`                    | raw signing message           |
//! | [`MultiKeyAccount`]  | `MultiKey` (K of N signatures) | per member                    |
//! | [`KeylessAccount`]   | `SingleKey` with a keyless sig | transaction and proof message |
//!
//! The address is normally derived from the authentication key, but an
//! account whose key was rotated keeps its original address; every
//! account type accepts an explicit address for that case.
//!
//! [`AccountSigner`] is the capability the builder needs. [`Account`]
//! dispatches over the concrete types for callers that hold accounts of
//! mixed schemes.

mod keyless;
mod multi_key;
mod single_key;

// Re-exports: public API surface.
pub use keyless::KeylessAccount;
pub use multi_key::MultiKeyAccount;
pub use single_key::{Ed25519Account, SingleKeyAccount};

use crate::{
    keyless::KeylessError,
    keys::{AuthenticationKey, DerivationError, MultiKeyError, PrivateKey},
    primitives::AccountAddress,
    transaction::{AccountAuthenticator, AnyRawTransaction, SigningMessage as _},
};

/// Signing failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    /// Keyless construction or signing failed, including expiry of the
    /// ephemeral key.
    #[error(transparent)]
    Keyless(#[from] KeylessError),

    /// A multi-key signer or bitmap problem.
    #[error(transparent)]
    MultiKey(#[from] MultiKeyError),

    /// Fewer signers than the multi-key threshold.
    #[error("multi-key requires {required} signers, got {provided}")]
    NotEnoughSigners {
        /// The threshold.
        required: u8,
        /// Signers held.
        provided: usize,
    },

    /// A multi-key member must sign with a single key; nested multi-keys
    /// and placeholders cannot.
    #[error("multi-key members must be single-key signers")]
    UnsupportedMultiKeyMember,

    /// Mnemonic derivation failed.
    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

/// Something that can authorize transactions for an address.
pub trait AccountSigner {
    /// The on-chain address.
    fn address(&self) -> AccountAddress;

    /// The authentication key of the current signing material.
    fn auth_key(&self) -> AuthenticationKey;

    /// Sign arbitrary bytes.
    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, SigningError>;

    /// Sign a transaction in its signing topology.
    fn sign_transaction(
        &self,
        txn: &AnyRawTransaction,
    ) -> Result<AccountAuthenticator, SigningError> {
        self.sign_message(&txn.signing_message())
    }
}

/// An account of any scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Account {
    /// Legacy Ed25519.
    Ed25519(Ed25519Account),
    /// SingleKey Ed25519 or Secp256k1.
    SingleKey(SingleKeyAccount),
    /// K-of-N.
    MultiKey(MultiKeyAccount),
    /// OIDC login.
    Keyless(Box<KeylessAccount>),
}

impl Account {
    /// An Ed25519 key becomes a legacy account, a Secp256k1 key a SingleKey
    /// account.
    #[must_use]
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        match private_key {
            PrivateKey::Ed25519(key) => Self::Ed25519(Ed25519Account::new(key)),
            key @ PrivateKey::Secp256k1(_) => Self::SingleKey(SingleKeyAccount::new(key)),
        }
    }
}

impl AccountSigner for Account {
    fn address(&self) -> AccountAddress {
        match self {
            Self::Ed25519(account) => account.address(),
            Self::SingleKey(account) => account.address(),
            Self::MultiKey(account) => account.address(),
            Self::Keyless(account) => account.address(),
        }
    }

    fn auth_key(&self) -> AuthenticationKey {
        match self {
            Self::Ed25519(account) => account.auth_key(),
            Self::SingleKey(account) => account.auth_key(),
            Self::MultiKey(account) => account.auth_key(),
            Self::Keyless(account) => account.auth_key(),
        }
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, SigningError> {
        match self {
            Self::Ed25519(account) => account.sign_message(message),
            Self::SingleKey(account) => account.sign_message(message),
            Self::MultiKey(account) => account.sign_message(message),
            Self::Keyless(account) => account.sign_message(message),
        }
    }

    fn sign_transaction(
        &self,
        txn: &AnyRawTransaction,
    ) -> Result<AccountAuthenticator, SigningError> {
        match self {
            Self::Ed25519(account) => account.sign_transaction(txn),
            Self::SingleKey(account) => account.sign_transaction(txn),
            Self::MultiKey(account) => account.sign_transaction(txn),
            Self::Keyless(account) => account.sign_transaction(txn),
        }
    }
}

impl From<Ed25519Account> for Account {
    fn from(account: Ed25519Account) -> Self {
        Self::Ed25519(account)
    }
}

impl From<SingleKeyAccount> for Account {
    fn from(account: SingleKeyAccount) -> Self {
        Self::SingleKey(account)
    }
}

impl From<MultiKeyAccount> for Account {
    fn from(account: MultiKeyAccount) -> Self {
        Self::MultiKey(account)
    }
}

impl From<KeylessAccount> for Account {
    fn from(account: KeylessAccount) -> Self {
        Self::Keyless(Box::new(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{AuthenticationKeyScheme as _, Ed25519PrivateKey, Secp256k1PrivateKey};

    /// Ed25519 keys default to the legacy scheme; the two address spaces
    /// differ for the same key.
    #[test]
    fn from_private_key_schemes() {
        let key = Ed25519PrivateKey::from_bytes(&[8u8; 32]).unwrap();
        let legacy = Account::from_private_key(key.clone().into());
        assert!(matches!(legacy, Account::Ed25519(_)));
        assert_eq!(legacy.address(), key.public_key().account_address());

        let single = SingleKeyAccount::new(key.into());
        assert_ne!(single.address(), legacy.address());

        let secp = Secp256k1PrivateKey::from_bytes(&[8u8; 32]).unwrap();
        let account = Account::from_private_key(secp.into());
        assert!(matches!(account, Account::SingleKey(_)));
    }

    #[test]
    fn dispatch_signs_with_inner_account() {
        let key = Ed25519PrivateKey::from_bytes(&[8u8; 32]).unwrap();
        let inner = Ed25519Account::new(key);
        let account = Account::from(inner.clone());
        assert_eq!(account.sign_message(b"m"), inner.sign_message(b"m"));
        assert_eq!(account.auth_key(), inner.auth_key());
        assert!(account.sign_message(b"m").unwrap().verify(b"m"));
    }
}
