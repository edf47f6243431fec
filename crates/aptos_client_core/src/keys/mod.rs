//! ## Keys and signatures
//!
//! Every account scheme reduces to a public key that can verify, a private
//! key that can sign, and a signature. The concrete schemes are plain
//! newtypes over their fixed-length bytes; the SingleKey wrapper
//! ([`AnyPublicKey`], [`AnySignature`]) tags one of them with a ULEB128
//! scheme index so the chain can dispatch on it.
//!
//! | scheme    | public key | private key | signature | SingleKey tag |
//! |-----------|-----------:|------------:|----------:|--------------:|
//! | Ed25519   | 32         | 32          | 64        | 0             |
//! | Secp256k1 | 65 (SEC1)  | 32          | 64        | 1             |
//! | Keyless   | iss + 32   | n/a         | varies    | 3             |
//! | Federated | 32 + iss + 32 | n/a      | keyless   | 4             |
//!
//! ```mermaid
//! flowchart TB
//!     mnemonic -- derivation --> sk[PrivateKey]
//!     sk -- public_key --> pk[AnyPublicKey]
//!     pk -- BCS + scheme --> ak[AuthenticationKey]
//!     ak --> addr[AccountAddress]
//!     pks["AnyPublicKey × N"] -- threshold --> mk[MultiKey]
//!     mk -- BCS + scheme --> ak
//! ```
//!
//! Capabilities are expressed as traits: [`Signer`] produces a signature,
//! [`Verifier`] checks one, and
//! [`AuthenticationKeyScheme`](auth_key::AuthenticationKeyScheme) derives
//! the account's authentication key.

/// `0x`-prefixed hex `Display`, `Debug` and `FromStr` for a type with
/// `as_bytes` and `from_bytes`.
macro_rules! impl_hex_text {
    ($($ty:ty),*) => {
        $(
            impl core::fmt::Display for $ty {
                fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    write!(formatter, "0x{}", hex::encode(self.as_bytes()))
                }
            }

            impl core::fmt::Debug for $ty {
                fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    write!(formatter, "{}({self})", stringify!($ty))
                }
            }

            impl core::str::FromStr for $ty {
                type Err = $crate::keys::KeyError;

                fn from_str(input: &str) -> Result<Self, Self::Err> {
                    Self::from_bytes(&$crate::primitives::decode_hex(input)?)
                }
            }
        )*
    };
}

pub mod auth_key;
pub mod derivation;
pub mod multi_key;

mod private;
mod public;
mod signature;

// Re-exports: public API surface.
pub use auth_key::{AuthenticationKey, AuthenticationKeyScheme, Scheme};
pub use derivation::DerivationError;
pub use multi_key::{MultiKey, MultiKeyError, MultiKeySignature};
pub use private::{Ed25519PrivateKey, PrivateKey, Secp256k1PrivateKey};
pub use public::{AnyPublicKey, Ed25519PublicKey, Secp256k1PublicKey};
pub use signature::{AnySignature, Ed25519Signature, Secp256k1Signature};

use crate::primitives::HexError;

/// Key or signature bytes that do not form a valid value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Byte-exact construction with the wrong number of bytes.
    #[error("{type_name} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// The type being constructed.
        type_name: &'static str,
        /// Required length.
        expected: usize,
        /// Length given.
        actual: usize,
    },

    /// Right length, but not a point or scalar of the curve.
    #[error("invalid {0}")]
    InvalidKey(&'static str),

    /// Hex text could not be decoded.
    #[error(transparent)]
    Hex(#[from] HexError),

    /// An AIP-80 string with the wrong scheme prefix.
    #[error("expected an AIP-80 '{expected}' private key")]
    Aip80Prefix {
        /// The prefix that was required.
        expected: &'static str,
    },
}

impl KeyError {
    pub(crate) const fn length(type_name: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidLength {
            type_name,
            expected,
            actual,
        }
    }
}

/// Produces signatures over arbitrary messages.
pub trait Signer {
    /// Signature produced.
    type Signature;

    /// Sign `message`.
    fn sign(&self, message: &[u8]) -> Self::Signature;
}

/// Checks signatures over arbitrary messages.
///
/// Verification never errors: malformed or mismatched input is `false`.
pub trait Verifier {
    /// Signature accepted.
    type Signature;

    /// Whether `signature` is valid for `message` under this key.
    fn verify(&self, message: &[u8], signature: &Self::Signature) -> bool;
}

/// Copy a slice into a fixed array, or report the length mismatch.
pub(crate) fn fixed_bytes<const N: usize>(
    type_name: &'static str,
    bytes: &[u8],
) -> Result<[u8; N], KeyError> {
    <[u8; N]>::try_from(bytes).map_err(|_err| KeyError::length(type_name, N, bytes.len()))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;

    /// A SingleKey Ed25519 signature verifies under its SingleKey public key
    /// and under nothing else.
    #[test]
    fn single_key_dispatch() {
        let mut rng = StdRng::seed_from_u64(0);
        let ed = PrivateKey::Ed25519(Ed25519PrivateKey::generate(&mut rng));
        let secp = PrivateKey::Secp256k1(Secp256k1PrivateKey::generate(&mut rng));
        let message = b"single key";

        let ed_sig = ed.sign(message);
        let secp_sig = secp.sign(message);

        assert!(ed.public_key().verify(message, &ed_sig));
        assert!(secp.public_key().verify(message, &secp_sig));
        assert!(!ed.public_key().verify(message, &secp_sig));
        assert!(!secp.public_key().verify(message, &ed_sig));
        assert!(!ed.public_key().verify(b"other", &ed_sig));
    }

    #[test]
    fn fixed_bytes_length() {
        assert_eq!(fixed_bytes::<2>("pair", &[1, 2]), Ok([1, 2]));
        assert_eq!(
            fixed_bytes::<2>("pair", &[1, 2, 3]),
            Err(KeyError::length("pair", 2, 3))
        );
    }
}
