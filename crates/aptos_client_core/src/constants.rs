//! Protocol-wide domain separators, scheme bytes and keyless limits.
//!
//! Every signed message on Aptos is prefixed with the SHA3-256 digest of a
//! domain separator string under the `APTOS::` namespace, so a signature
//! over one kind of structure can never be replayed as another.

use sha3::{Digest as _, Sha3_256};

/// Required prefix of every domain separator.
pub const DOMAIN_SEPARATOR_PREFIX: &str = "APTOS::";

/// Seed for the SLIP-0010 Ed25519 master key.
pub const ED25519_SEED_KEY: &[u8; 12] = b"ed25519 seed";

/// Seed for the BIP32 Secp256k1 master key.
pub const SECP256K1_SEED_KEY: &[u8; 12] = b"Bitcoin seed";

/// BIP44 coin type registered for Aptos.
pub const APTOS_COIN_TYPE: u32 = 637;

/// Pepper length in bytes.
pub const PEPPER_LENGTH: usize = 31;

/// Ephemeral key pair blinder length in bytes.
pub const EPK_BLINDER_LENGTH: usize = 31;

/// Identity commitment length in bytes.
pub const ID_COMMITMENT_LENGTH: usize = 32;

/// Maximum padded length of the `aud` claim.
pub const MAX_AUD_VAL_BYTES: usize = 120;

/// Maximum padded length of the uid claim value.
pub const MAX_UID_VAL_BYTES: usize = 330;

/// Maximum padded length of the uid claim key.
pub const MAX_UID_KEY_BYTES: usize = 30;

/// Maximum padded length of the BCS ephemeral public key in the nonce.
pub const MAX_COMMITED_EPK_BYTES: usize = 93;

/// Bytes packed into one BN254 scalar; 31 stays below the modulus.
pub const BYTES_PACKED_PER_SCALAR: usize = 31;

/// Maximum number of scalars a Poseidon input may be packed into.
pub const MAX_NUM_INPUT_SCALARS: usize = 16;

/// Default ephemeral key pair lifetime: 14 days.
pub const EPK_DEFAULT_LIFETIME_SECS: u64 = 14 * 24 * 60 * 60;

/// Maximum number of keys in a MultiKey.
pub const MAX_MULTI_KEY_SIGNATURES: usize = 32;

/// Bitmap width in bytes for MultiKey signatures.
pub const MULTI_KEY_BITMAP_LENGTH: usize = 4;

/// Default gas limit for built transactions.
pub const DEFAULT_MAX_GAS_AMOUNT: u64 = 200_000;

/// Default price per gas unit, in octas.
pub const DEFAULT_GAS_UNIT_PRICE: u64 = 100;

/// Default lifetime of a built transaction.
pub const DEFAULT_TXN_EXPIRY_SECS: u64 = 20;

/// Sequence number placed in orderless transactions, which are replay
/// protected by a nonce instead.
pub const ORDERLESS_SEQUENCE_NUMBER: u64 = 0xdead_beef;

/// A domain separator string under the `APTOS::` namespace.
///
/// `signing_message = SHA3-256(separator) || bytes`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainSeparator<'sep> {
    separator: &'sep str,
}

/// Domain separator did not start with [`DOMAIN_SEPARATOR_PREFIX`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("domain separator must start with 'APTOS::', got '{0}'")]
pub struct InvalidDomainSeparator(pub String);

impl<'sep> DomainSeparator<'sep> {
    /// `APTOS::RawTransaction` for single-signer transactions.
    pub const RAW_TRANSACTION: Self = Self {
        separator: "APTOS::RawTransaction",
    };
    /// `APTOS::RawTransactionWithData` for multi-agent and fee-payer
    /// transactions.
    pub const RAW_TRANSACTION_WITH_DATA: Self = Self {
        separator: "APTOS::RawTransactionWithData",
    };
    /// `APTOS::TransactionAndProof` for keyless signatures.
    pub const TRANSACTION_AND_PROOF: Self = Self {
        separator: "APTOS::TransactionAndProof",
    };
    /// `APTOS::Transaction` for committed transaction hashes.
    pub const TRANSACTION: Self = Self {
        separator: "APTOS::Transaction",
    };

    /// Validate a caller-supplied separator.
    pub fn new(separator: &'sep str) -> Result<Self, InvalidDomainSeparator> {
        if separator.starts_with(DOMAIN_SEPARATOR_PREFIX) {
            Ok(Self { separator })
        } else {
            Err(InvalidDomainSeparator(separator.to_owned()))
        }
    }

    /// The separator string.
    #[must_use]
    pub const fn as_str(&self) -> &'sep str {
        self.separator
    }

    /// `SHA3-256(separator)`.
    #[must_use]
    pub fn prefix(&self) -> [u8; 32] {
        Sha3_256::digest(self.separator.as_bytes()).into()
    }

    /// `SHA3-256(separator) || bytes`.
    #[must_use]
    pub fn with(&self, bytes: &[u8]) -> Vec<u8> {
        let mut message = Vec::with_capacity(32 + bytes.len());
        message.extend_from_slice(&self.prefix());
        message.extend_from_slice(bytes);
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Different separators produce different prefixes over the same bytes.
    #[test]
    fn separators_independent() {
        let body = [0x42u8; 8];
        let raw = DomainSeparator::RAW_TRANSACTION.with(&body);
        let with_data = DomainSeparator::RAW_TRANSACTION_WITH_DATA.with(&body);
        assert_ne!(raw, with_data);
        assert_eq!(&raw[32..], &body);
    }

    /// The `APTOS::RawTransaction` prefix matches the published digest.
    #[test]
    fn raw_transaction_prefix() {
        assert_eq!(
            hex::encode(DomainSeparator::RAW_TRANSACTION.prefix()),
            "b5e97db07fa0bd0e5598aa3643a9bc6f6693bddc1a9fec9e674a461eaa00b193"
        );
    }

    /// Separators outside the `APTOS::` namespace are rejected.
    #[test]
    fn foreign_separator_rejected() {
        assert!(DomainSeparator::new("APTOS::Custom").is_ok());
        assert_eq!(
            DomainSeparator::new("SUI::Intent"),
            Err(InvalidDomainSeparator("SUI::Intent".to_owned()))
        );
    }
}
