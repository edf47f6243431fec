//! Who signed, and how.
//!
//! | tag | `AccountAuthenticator`    | `TransactionAuthenticator` |
//! |----:|---------------------------|----------------------------|
//! | 0   | Ed25519                   | Ed25519                    |
//! | 1   | MultiEd25519 (legacy)     | MultiEd25519 (legacy)      |
//! | 2   | SingleKey                 | MultiAgent                 |
//! | 3   | MultiKey                  | FeePayer                   |
//! | 4   | NoAccountAuthenticator    | SingleSender               |
//!
//! The legacy MultiEd25519 scheme is not modelled; its tag decodes as an
//! unknown variant.

use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    keys::{
        AnyPublicKey, AnySignature, Ed25519PublicKey, Ed25519Signature, MultiKey,
        MultiKeySignature, Verifier as _,
    },
    primitives::AccountAddress,
};

/// One account's proof of authorization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountAuthenticator {
    /// Tag 0.
    Ed25519 {
        /// The signer's key.
        public_key: Ed25519PublicKey,
        /// The signature.
        signature: Ed25519Signature,
    },
    /// Tag 2.
    SingleKey {
        /// The signer's key.
        public_key: AnyPublicKey,
        /// The signature.
        signature: AnySignature,
    },
    /// Tag 3.
    MultiKey {
        /// The K-of-N key.
        public_key: MultiKey,
        /// The K signatures and their bitmap.
        signature: MultiKeySignature,
    },
    /// Tag 4: a placeholder for a signer that has not signed yet, used when
    /// simulating or before a sponsor is known.
    NoAccountAuthenticator,
}

impl AccountAuthenticator {
    /// The ULEB128 variant tag.
    #[must_use]
    pub const fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::SingleKey { .. } => 2,
            Self::MultiKey { .. } => 3,
            Self::NoAccountAuthenticator => 4,
        }
    }

    /// Whether the signature is valid for `message`.
    ///
    /// Placeholders never verify, nor do keyless signatures, which need the
    /// chain's JWKs.
    #[must_use]
    pub fn verify(&self, message: &[u8]) -> bool {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => public_key.verify(message, signature),
            Self::SingleKey {
                public_key,
                signature,
            } => public_key.verify(message, signature),
            Self::MultiKey {
                public_key,
                signature,
            } => public_key.verify(message, signature),
            Self::NoAccountAuthenticator => false,
        }
    }
}

impl Encode for AccountAuthenticator {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_variant(self.variant_index());
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => {
                public_key.encode(serializer);
                signature.encode(serializer);
            }
            Self::SingleKey {
                public_key,
                signature,
            } => {
                public_key.encode(serializer);
                signature.encode(serializer);
            }
            Self::MultiKey {
                public_key,
                signature,
            } => {
                public_key.encode(serializer);
                signature.encode(serializer);
            }
            Self::NoAccountAuthenticator => {}
        }
    }
}

impl Decode for AccountAuthenticator {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => Ok(Self::Ed25519 {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            }),
            2 => Ok(Self::SingleKey {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            }),
            3 => Ok(Self::MultiKey {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            }),
            4 => Ok(Self::NoAccountAuthenticator),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "AccountAuthenticator",
                tag,
            }),
        }
    }
}

/// The authorization attached to a signed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionAuthenticator {
    /// Tag 0: a legacy Ed25519 sender alone.
    Ed25519 {
        /// The sender's key.
        public_key: Ed25519PublicKey,
        /// The sender's signature.
        signature: Ed25519Signature,
    },
    /// Tag 2: sender plus secondary signers.
    MultiAgent {
        /// The sender.
        sender: AccountAuthenticator,
        /// Secondary signer addresses, in signing order.
        secondary_signer_addresses: Vec<AccountAddress>,
        /// Secondary signers, matching the addresses.
        secondary_signers: Vec<AccountAuthenticator>,
    },
    /// Tag 3: multi-agent plus a sponsor paying gas.
    FeePayer {
        /// The sender.
        sender: AccountAuthenticator,
        /// Secondary signer addresses, in signing order.
        secondary_signer_addresses: Vec<AccountAddress>,
        /// Secondary signers, matching the addresses.
        secondary_signers: Vec<AccountAuthenticator>,
        /// The sponsor.
        fee_payer_address: AccountAddress,
        /// The sponsor's authorization.
        fee_payer_signer: AccountAuthenticator,
    },
    /// Tag 4: a sender of any non-legacy scheme alone.
    SingleSender {
        /// The sender.
        sender: AccountAuthenticator,
    },
}

impl TransactionAuthenticator {
    /// The ULEB128 variant tag.
    #[must_use]
    pub const fn variant_index(&self) -> u32 {
        match self {
            Self::Ed25519 { .. } => 0,
            Self::MultiAgent { .. } => 2,
            Self::FeePayer { .. } => 3,
            Self::SingleSender { .. } => 4,
        }
    }

    /// A lone sender: the legacy Ed25519 form when possible, otherwise
    /// SingleSender.
    #[must_use]
    pub fn single(sender: AccountAuthenticator) -> Self {
        match sender {
            AccountAuthenticator::Ed25519 {
                public_key,
                signature,
            } => Self::Ed25519 {
                public_key,
                signature,
            },
            sender => Self::SingleSender { sender },
        }
    }

    /// The sender's authenticator.
    #[must_use]
    pub fn sender(&self) -> AccountAuthenticator {
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => AccountAuthenticator::Ed25519 {
                public_key: *public_key,
                signature: *signature,
            },
            Self::MultiAgent { sender, .. }
            | Self::FeePayer { sender, .. }
            | Self::SingleSender { sender } => sender.clone(),
        }
    }
}

impl Encode for TransactionAuthenticator {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_variant(self.variant_index());
        match self {
            Self::Ed25519 {
                public_key,
                signature,
            } => {
                public_key.encode(serializer);
                signature.encode(serializer);
            }
            Self::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                sender.encode(serializer);
                secondary_signer_addresses.encode(serializer);
                secondary_signers.encode(serializer);
            }
            Self::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                sender.encode(serializer);
                secondary_signer_addresses.encode(serializer);
                secondary_signers.encode(serializer);
                fee_payer_address.encode(serializer);
                fee_payer_signer.encode(serializer);
            }
            Self::SingleSender { sender } => sender.encode(serializer),
        }
    }
}

impl Decode for TransactionAuthenticator {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => Ok(Self::Ed25519 {
                public_key: deserializer.deserialize()?,
                signature: deserializer.deserialize()?,
            }),
            2 => Ok(Self::MultiAgent {
                sender: deserializer.deserialize()?,
                secondary_signer_addresses: deserializer.deserialize_vec()?,
                secondary_signers: deserializer.deserialize_vec()?,
            }),
            3 => Ok(Self::FeePayer {
                sender: deserializer.deserialize()?,
                secondary_signer_addresses: deserializer.deserialize_vec()?,
                secondary_signers: deserializer.deserialize_vec()?,
                fee_payer_address: deserializer.deserialize()?,
                fee_payer_signer: deserializer.deserialize()?,
            }),
            4 => Ok(Self::SingleSender {
                sender: deserializer.deserialize()?,
            }),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "TransactionAuthenticator",
                tag,
            }),
        }
    }
}
