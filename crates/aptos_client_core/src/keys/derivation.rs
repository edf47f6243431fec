//! ## Hierarchical deterministic key derivation
//!
//! Both schemes start from the BIP39 seed of a mnemonic (empty passphrase)
//! and walk a BIP44 path under coin type 637.
//!
//! | scheme    | standard   | master HMAC key  | path                      |
//! |-----------|------------|------------------|---------------------------|
//! | Ed25519   | SLIP-0010  | `"ed25519 seed"` | `m/44'/637'/a'/c'/i'`     |
//! | Secp256k1 | BIP32      | `"Bitcoin seed"` | `m/44'/637'/a'/c/i`       |
//!
//! SLIP-0010 over Ed25519 only supports hardened children, so every
//! segment is hardened whether or not the final `'` is written.
//!
//! $$I = \text{HMAC-SHA512}(c_{par}, \mathsf{data}), \quad
//!   (k_i, c_i) = (I_L, I_R) \text{ (SLIP-0010)}, \quad
//!   (k_i, c_i) = (I_L + k_{par} \bmod n, I_R) \text{ (BIP32)}$$

use bip39::{Language, Mnemonic, Seed};
use hmac::{Hmac, Mac as _};
use k256::{FieldBytes, Scalar, ecdsa::SigningKey, elliptic_curve::PrimeField as _};
use sha2::Sha512;

use super::{Ed25519PrivateKey, KeyError, Secp256k1PrivateKey};
use crate::constants::{APTOS_COIN_TYPE, ED25519_SEED_KEY, SECP256K1_SEED_KEY};

/// Offset added to an index to make a hardened child.
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Derivation failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    /// The path does not match the scheme's pattern.
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// Not a valid English BIP39 mnemonic.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// BIP32 produced a scalar of zero or above the group order.
    #[error("derived secp256k1 key is out of range")]
    InvalidChildKey,

    /// The HMAC rejected its key.
    #[error("hmac key rejected")]
    HmacKey,

    /// The derived bytes were not a valid private key.
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Hardening {
    Required,
    Forbidden,
    Optional,
}

/// Parse `m/44'/637'/x/y/z` under per-segment hardening rules for the last
/// three segments. Returned indices exclude the hardened offset.
fn parse_path(path: &str, rules: [Hardening; 3]) -> Option<[u32; 5]> {
    let prefix = format!("m/44'/{APTOS_COIN_TYPE}'/");
    let rest = path.strip_prefix(prefix.as_str())?;
    let mut parts = rest.split('/');
    let mut indices = [44, APTOS_COIN_TYPE, 0, 0, 0];
    for (slot, rule) in indices.iter_mut().skip(2).zip(rules) {
        let part = parts.next()?;
        let (digits, hardened) = match part.strip_suffix('\'') {
            Some(digits) => (digits, true),
            None => (part, false),
        };
        let allowed = match rule {
            Hardening::Required => hardened,
            Hardening::Forbidden => !hardened,
            Hardening::Optional => true,
        };
        if !allowed || digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        *slot = digits.parse().ok().filter(|index| *index < HARDENED_OFFSET)?;
    }
    parts.next().is_none().then_some(indices)
}

/// `m/44'/637'/a'/c'/i'` with the final `'` optional.
#[must_use]
pub fn is_valid_hardened_path(path: &str) -> bool {
    parse_path(path, hardened_rules()).is_some()
}

/// `m/44'/637'/a'/c/i`.
#[must_use]
pub fn is_valid_bip44_path(path: &str) -> bool {
    parse_path(path, bip44_rules()).is_some()
}

const fn hardened_rules() -> [Hardening; 3] {
    [Hardening::Required, Hardening::Required, Hardening::Optional]
}

const fn bip44_rules() -> [Hardening; 3] {
    [Hardening::Required, Hardening::Forbidden, Hardening::Forbidden]
}

/// Trim, lowercase and collapse whitespace.
fn normalize_mnemonic(mnemonic: &str) -> String {
    mnemonic
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The 64-byte BIP39 seed of a mnemonic with an empty passphrase.
pub fn mnemonic_to_seed(mnemonic: &str) -> Result<Vec<u8>, DerivationError> {
    let phrase = normalize_mnemonic(mnemonic);
    let parsed = Mnemonic::from_phrase(&phrase, Language::English)
        .map_err(|err| DerivationError::InvalidMnemonic(err.to_string()))?;
    Ok(Seed::new(&parsed, "").as_bytes().to_vec())
}

/// A private key and chain code.
struct ExtendedKey {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Split `HMAC-SHA512(key, data...)` into `(I_L, I_R)`.
    fn from_hmac(key: &[u8], data: &[&[u8]]) -> Result<Self, DerivationError> {
        let mut mac =
            Hmac::<Sha512>::new_from_slice(key).map_err(|_err| DerivationError::HmacKey)?;
        for part in data {
            mac.update(part);
        }
        let digest: [u8; 64] = mac.finalize().into_bytes().into();
        let (left, right) = digest.split_at(32);
        let mut extended = Self {
            key: [0u8; 32],
            chain_code: [0u8; 32],
        };
        extended.key.copy_from_slice(left);
        extended.chain_code.copy_from_slice(right);
        Ok(extended)
    }
}

/// SLIP-0010 Ed25519: every index is hardened.
#[expect(clippy::big_endian_bytes, reason = "child indices are serialized big-endian")]
fn slip10(seed: &[u8], indices: &[u32]) -> Result<ExtendedKey, DerivationError> {
    let mut node = ExtendedKey::from_hmac(ED25519_SEED_KEY, &[seed])?;
    for index in indices {
        let child = (index | HARDENED_OFFSET).to_be_bytes();
        node = ExtendedKey::from_hmac(&node.chain_code, &[&[0u8], &node.key, &child])?;
    }
    Ok(node)
}

/// A secp256k1 scalar in `1..n`.
fn nonzero_scalar(bytes: [u8; 32]) -> Option<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(bytes)))
        .filter(|scalar| !bool::from(scalar.is_zero()))
}

/// BIP32 private derivation; `indices` carry the hardened offset where set.
#[expect(clippy::big_endian_bytes, reason = "child indices are serialized big-endian")]
fn bip32(seed: &[u8], indices: &[u32]) -> Result<ExtendedKey, DerivationError> {
    let mut node = ExtendedKey::from_hmac(SECP256K1_SEED_KEY, &[seed])?;
    nonzero_scalar(node.key).ok_or(DerivationError::InvalidChildKey)?;
    for &index in indices {
        let child = index.to_be_bytes();
        let next = if index >= HARDENED_OFFSET {
            ExtendedKey::from_hmac(&node.chain_code, &[&[0u8], &node.key, &child])?
        } else {
            let parent = SigningKey::from_bytes(&FieldBytes::from(node.key))
                .map_err(|_err| DerivationError::InvalidChildKey)?;
            let point = parent.verifying_key().to_encoded_point(true);
            ExtendedKey::from_hmac(&node.chain_code, &[point.as_bytes(), &child])?
        };
        let tweak = nonzero_scalar(next.key).ok_or(DerivationError::InvalidChildKey)?;
        let parent = nonzero_scalar(node.key).ok_or(DerivationError::InvalidChildKey)?;
        let sum = tweak + parent;
        if bool::from(sum.is_zero()) {
            return Err(DerivationError::InvalidChildKey);
        }
        node = ExtendedKey {
            key: sum.to_bytes().into(),
            chain_code: next.chain_code,
        };
    }
    Ok(node)
}

/// Derive an Ed25519 key from a mnemonic along `m/44'/637'/a'/c'/i'`.
pub fn derive_ed25519(path: &str, mnemonic: &str) -> Result<Ed25519PrivateKey, DerivationError> {
    let indices = parse_path(path, hardened_rules())
        .ok_or_else(|| DerivationError::InvalidPath(path.to_owned()))?;
    let node = slip10(&mnemonic_to_seed(mnemonic)?, &indices)?;
    Ok(Ed25519PrivateKey::from_bytes(&node.key)?)
}

/// Derive a Secp256k1 key from a mnemonic along `m/44'/637'/a'/c/i`.
pub fn derive_secp256k1(
    path: &str,
    mnemonic: &str,
) -> Result<Secp256k1PrivateKey, DerivationError> {
    let [purpose, coin, account, change, index] = parse_path(path, bip44_rules())
        .ok_or_else(|| DerivationError::InvalidPath(path.to_owned()))?;
    let indices = [
        purpose | HARDENED_OFFSET,
        coin | HARDENED_OFFSET,
        account | HARDENED_OFFSET,
        change,
        index,
    ];
    let node = bip32(&mnemonic_to_seed(mnemonic)?, &indices)?;
    Ok(Secp256k1PrivateKey::from_bytes(&node.key)?)
}
