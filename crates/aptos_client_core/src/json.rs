//! JSON envelopes for keys and signatures.
//!
//! Nodes and wallets exchange keys and signatures as
//! `{"type": "<scheme>", "value": "0x..."}`. The scheme name selects the
//! variant through a fixed table; the value is hex.
//!
//! | name                | public key                  | signature            |
//! |---------------------|-----------------------------|----------------------|
//! | `ed25519`           | 32 raw bytes                | 64 raw bytes         |
//! | `secp256k1_ecdsa`   | 65 raw bytes (uncompressed) | 64 raw bytes         |
//! | `keyless`           | BCS                         | BCS                  |
//! | `federated_keyless` | BCS                         | n/a                  |
//! | `multi_key`         | BCS                         | BCS                  |
//! | `single_key`        | BCS of the tagged key       | BCS of the tagged signature |

use core::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::{
    bcs::{Decode, DecodeError, Encode},
    keyless::{FederatedKeylessPublicKey, KeylessPublicKey, KeylessSignature},
    keys::{
        AnyPublicKey, AnySignature, Ed25519PublicKey, Ed25519Signature, KeyError, MultiKey,
        MultiKeySignature, Secp256k1PublicKey, Secp256k1Signature,
    },
    primitives::{Hex, HexError},
};

/// JSON envelope failures.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// Not a known scheme name.
    #[error("unknown scheme '{0}'")]
    UnknownScheme(String),

    /// A known scheme that has no form for this kind of value.
    #[error("scheme '{scheme}' has no {kind} form")]
    UnsupportedScheme {
        /// The scheme name.
        scheme: &'static str,
        /// `"public key"` or `"signature"`.
        kind: &'static str,
    },

    /// The value is not hex.
    #[error(transparent)]
    Hex(#[from] HexError),

    /// Raw key or signature bytes were rejected.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// BCS bytes were rejected.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The document is not an envelope.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Scheme names used as the JSON `type` discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemeName {
    /// `ed25519`
    Ed25519,
    /// `secp256k1_ecdsa`
    Secp256k1Ecdsa,
    /// `keyless`
    Keyless,
    /// `federated_keyless`
    FederatedKeyless,
    /// `multi_key`
    MultiKey,
    /// `single_key`
    SingleKey,
}

const SCHEME_NAMES: [(SchemeName, &str); 6] = [
    (SchemeName::Ed25519, "ed25519"),
    (SchemeName::Secp256k1Ecdsa, "secp256k1_ecdsa"),
    (SchemeName::Keyless, "keyless"),
    (SchemeName::FederatedKeyless, "federated_keyless"),
    (SchemeName::MultiKey, "multi_key"),
    (SchemeName::SingleKey, "single_key"),
];

impl SchemeName {
    /// The wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        SCHEME_NAMES
            .iter()
            .find_map(|&(scheme, name)| (scheme == self).then_some(name))
            .unwrap_or_default()
    }
}

impl fmt::Display for SchemeName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SchemeName {
    type Err = JsonError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        SCHEME_NAMES
            .iter()
            .find_map(|&(scheme, known)| (known == name).then_some(scheme))
            .ok_or_else(|| JsonError::UnknownScheme(name.to_owned()))
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    scheme: String,
    value: Hex,
}

impl Envelope {
    fn new(scheme: SchemeName, value: Vec<u8>) -> Self {
        Self {
            scheme: scheme.as_str().to_owned(),
            value: value.into(),
        }
    }
}

/// A public key tagged with its scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKeyJson {
    /// `ed25519`
    Ed25519(Ed25519PublicKey),
    /// `secp256k1_ecdsa`
    Secp256k1Ecdsa(Secp256k1PublicKey),
    /// `keyless`
    Keyless(KeylessPublicKey),
    /// `federated_keyless`
    FederatedKeyless(FederatedKeylessPublicKey),
    /// `multi_key`
    MultiKey(MultiKey),
    /// `single_key`
    SingleKey(AnyPublicKey),
}

impl PublicKeyJson {
    /// The scheme name.
    #[must_use]
    pub const fn scheme(&self) -> SchemeName {
        match self {
            Self::Ed25519(_) => SchemeName::Ed25519,
            Self::Secp256k1Ecdsa(_) => SchemeName::Secp256k1Ecdsa,
            Self::Keyless(_) => SchemeName::Keyless,
            Self::FederatedKeyless(_) => SchemeName::FederatedKeyless,
            Self::MultiKey(_) => SchemeName::MultiKey,
            Self::SingleKey(_) => SchemeName::SingleKey,
        }
    }

    /// The envelope as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.scheme().as_str(),
            "value": Hex::from(self.value_bytes()).to_string(),
        })
    }

    /// Read an envelope.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, JsonError> {
        let envelope = Envelope::deserialize(value)?;
        Self::from_envelope(&envelope)
    }

    fn value_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.to_bytes().to_vec(),
            Self::Secp256k1Ecdsa(key) => key.to_bytes().to_vec(),
            Self::Keyless(key) => key.to_bcs_bytes(),
            Self::FederatedKeyless(key) => key.to_bcs_bytes(),
            Self::MultiKey(key) => key.to_bcs_bytes(),
            Self::SingleKey(key) => key.to_bcs_bytes(),
        }
    }

    fn from_envelope(envelope: &Envelope) -> Result<Self, JsonError> {
        let bytes = envelope.value.as_bytes();
        Ok(match envelope.scheme.parse()? {
            SchemeName::Ed25519 => Self::Ed25519(Ed25519PublicKey::from_bytes(bytes)?),
            SchemeName::Secp256k1Ecdsa => {
                Self::Secp256k1Ecdsa(Secp256k1PublicKey::from_bytes(bytes)?)
            }
            SchemeName::Keyless => Self::Keyless(KeylessPublicKey::from_bcs_bytes(bytes)?),
            SchemeName::FederatedKeyless => {
                Self::FederatedKeyless(FederatedKeylessPublicKey::from_bcs_bytes(bytes)?)
            }
            SchemeName::MultiKey => Self::MultiKey(MultiKey::from_bcs_bytes(bytes)?),
            SchemeName::SingleKey => Self::SingleKey(AnyPublicKey::from_bcs_bytes(bytes)?),
        })
    }
}

/// A signature tagged with its scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureJson {
    /// `ed25519`
    Ed25519(Ed25519Signature),
    /// `secp256k1_ecdsa`
    Secp256k1Ecdsa(Secp256k1Signature),
    /// `keyless`
    Keyless(Box<KeylessSignature>),
    /// `multi_key`
    MultiKey(MultiKeySignature),
    /// `single_key`
    SingleKey(AnySignature),
}

impl SignatureJson {
    /// The scheme name.
    #[must_use]
    pub const fn scheme(&self) -> SchemeName {
        match self {
            Self::Ed25519(_) => SchemeName::Ed25519,
            Self::Secp256k1Ecdsa(_) => SchemeName::Secp256k1Ecdsa,
            Self::Keyless(_) => SchemeName::Keyless,
            Self::MultiKey(_) => SchemeName::MultiKey,
            Self::SingleKey(_) => SchemeName::SingleKey,
        }
    }

    /// The envelope as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.scheme().as_str(),
            "value": Hex::from(self.value_bytes()).to_string(),
        })
    }

    /// Read an envelope.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, JsonError> {
        let envelope = Envelope::deserialize(value)?;
        Self::from_envelope(&envelope)
    }

    fn value_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(signature) => signature.to_bytes().to_vec(),
            Self::Secp256k1Ecdsa(signature) => signature.to_bytes().to_vec(),
            Self::Keyless(signature) => signature.to_bcs_bytes(),
            Self::MultiKey(signature) => signature.to_bcs_bytes(),
            Self::SingleKey(signature) => signature.to_bcs_bytes(),
        }
    }

    fn from_envelope(envelope: &Envelope) -> Result<Self, JsonError> {
        let bytes = envelope.value.as_bytes();
        Ok(match envelope.scheme.parse()? {
            SchemeName::Ed25519 => Self::Ed25519(Ed25519Signature::from_bytes(bytes)?),
            SchemeName::Secp256k1Ecdsa => {
                Self::Secp256k1Ecdsa(Secp256k1Signature::from_bytes(bytes)?)
            }
            SchemeName::Keyless => {
                Self::Keyless(Box::new(KeylessSignature::from_bcs_bytes(bytes)?))
            }
            SchemeName::MultiKey => Self::MultiKey(MultiKeySignature::from_bcs_bytes(bytes)?),
            SchemeName::SingleKey => Self::SingleKey(AnySignature::from_bcs_bytes(bytes)?),
            scheme @ SchemeName::FederatedKeyless => {
                return Err(JsonError::UnsupportedScheme {
                    scheme: scheme.as_str(),
                    kind: "signature",
                });
            }
        })
    }
}

impl Serialize for PublicKeyJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope::new(self.scheme(), self.value_bytes()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKeyJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = Envelope::deserialize(deserializer)?;
        Self::from_envelope(&envelope).map_err(D::Error::custom)
    }
}

impl Serialize for SignatureJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope::new(self.scheme(), self.value_bytes()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SignatureJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = Envelope::deserialize(deserializer)?;
        Self::from_envelope(&envelope).map_err(D::Error::custom)
    }
}

impl From<AnyPublicKey> for PublicKeyJson {
    fn from(key: AnyPublicKey) -> Self {
        Self::SingleKey(key)
    }
}

impl From<MultiKey> for PublicKeyJson {
    fn from(key: MultiKey) -> Self {
        Self::MultiKey(key)
    }
}

impl From<AnySignature> for SignatureJson {
    fn from(signature: AnySignature) -> Self {
        Self::SingleKey(signature)
    }
}

impl From<MultiKeySignature> for SignatureJson {
    fn from(signature: MultiKeySignature) -> Self {
        Self::MultiKey(signature)
    }
}
