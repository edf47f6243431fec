//! ## Transactions
//!
//! A [`RawTransaction`] is what a sender proposes; a [`SignedTransaction`]
//! pairs it with a [`TransactionAuthenticator`] proving every required
//! party agreed. Transactions with secondary signers or a fee payer sign
//! a [`RawTransactionWithData`] instead, so each party commits to the full
//! signer set.
//!
//! | topology      | signed bytes                                  | authenticator  |
//! |---------------|-----------------------------------------------|----------------|
//! | single signer | `RawTransaction`                              | Ed25519 / SingleSender |
//! | multi-agent   | `RawTransactionWithData::MultiAgent`          | MultiAgent     |
//! | fee payer     | `RawTransactionWithData::MultiAgentWithFeePayer` | FeePayer    |
//!
//! Every signed message is domain separated; see [`signing`].

mod authenticator;
mod payload;
pub mod signing;

use core::iter;

use sha3::{Digest as _, Sha3_256};

// Re-exports: public API surface.
pub use authenticator::{AccountAuthenticator, TransactionAuthenticator};
pub use payload::{
    EntryFunction, Multisig, MultisigTransactionPayload, PayloadError, Script, ScriptArgument,
    TransactionExecutable, TransactionExtraConfig, TransactionInnerPayload, TransactionPayload,
};
pub use signing::SigningMessage;

use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    constants::DomainSeparator,
    primitives::{AccountAddress, ChainId},
};

/// A transaction before signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTransaction {
    /// The sending account.
    pub sender: AccountAddress,
    /// The sender's next sequence number.
    pub sequence_number: u64,
    /// What to execute.
    pub payload: TransactionPayload,
    /// Gas units the sender will pay for at most.
    pub max_gas_amount: u64,
    /// Octas per gas unit.
    pub gas_unit_price: u64,
    /// Seconds since the epoch after which the transaction is discarded.
    pub expiration_timestamp_secs: u64,
    /// The network.
    pub chain_id: ChainId,
}

impl Encode for RawTransaction {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.sender.encode(serializer);
        serializer.serialize_u64(self.sequence_number);
        self.payload.encode(serializer);
        serializer.serialize_u64(self.max_gas_amount);
        serializer.serialize_u64(self.gas_unit_price);
        serializer.serialize_u64(self.expiration_timestamp_secs);
        self.chain_id.encode(serializer);
    }
}

impl Decode for RawTransaction {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            sender: deserializer.deserialize()?,
            sequence_number: deserializer.deserialize_u64()?,
            payload: deserializer.deserialize()?,
            max_gas_amount: deserializer.deserialize_u64()?,
            gas_unit_price: deserializer.deserialize_u64()?,
            expiration_timestamp_secs: deserializer.deserialize_u64()?,
            chain_id: deserializer.deserialize()?,
        })
    }
}

/// A raw transaction together with its additional signers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawTransactionWithData {
    /// Tag 0.
    MultiAgent {
        /// The transaction.
        raw_txn: RawTransaction,
        /// Secondary signers, in order.
        secondary_signer_addresses: Vec<AccountAddress>,
    },
    /// Tag 1.
    MultiAgentWithFeePayer {
        /// The transaction.
        raw_txn: RawTransaction,
        /// Secondary signers, in order.
        secondary_signer_addresses: Vec<AccountAddress>,
        /// The sponsor, or `0x0` while unknown.
        fee_payer_address: AccountAddress,
    },
}

impl Encode for RawTransactionWithData {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::MultiAgent {
                raw_txn,
                secondary_signer_addresses,
            } => {
                serializer.serialize_variant(0);
                raw_txn.encode(serializer);
                secondary_signer_addresses.encode(serializer);
            }
            Self::MultiAgentWithFeePayer {
                raw_txn,
                secondary_signer_addresses,
                fee_payer_address,
            } => {
                serializer.serialize_variant(1);
                raw_txn.encode(serializer);
                secondary_signer_addresses.encode(serializer);
                fee_payer_address.encode(serializer);
            }
        }
    }
}

impl Decode for RawTransactionWithData {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => Ok(Self::MultiAgent {
                raw_txn: deserializer.deserialize()?,
                secondary_signer_addresses: deserializer.deserialize_vec()?,
            }),
            1 => Ok(Self::MultiAgentWithFeePayer {
                raw_txn: deserializer.deserialize()?,
                secondary_signer_addresses: deserializer.deserialize_vec()?,
                fee_payer_address: deserializer.deserialize()?,
            }),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "RawTransactionWithData",
                tag,
            }),
        }
    }
}

/// A transaction of any topology, ready to be signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnyRawTransaction {
    /// A sender alone.
    Simple(RawTransaction),
    /// Secondary signers, a fee payer or both.
    WithData(RawTransactionWithData),
}

impl AnyRawTransaction {
    /// Attach secondary signers and, when `fee_payer` is given, a fee
    /// payer; without either this is a simple transaction.
    #[must_use]
    pub fn new(
        raw_txn: RawTransaction,
        secondary_signer_addresses: Vec<AccountAddress>,
        fee_payer_address: Option<AccountAddress>,
    ) -> Self {
        match fee_payer_address {
            Some(fee_payer_address) => {
                Self::WithData(RawTransactionWithData::MultiAgentWithFeePayer {
                    raw_txn,
                    secondary_signer_addresses,
                    fee_payer_address,
                })
            }
            None if secondary_signer_addresses.is_empty() => Self::Simple(raw_txn),
            None => Self::WithData(RawTransactionWithData::MultiAgent {
                raw_txn,
                secondary_signer_addresses,
            }),
        }
    }

    /// The underlying raw transaction.
    #[must_use]
    pub const fn raw_transaction(&self) -> &RawTransaction {
        match self {
            Self::Simple(raw_txn)
            | Self::WithData(
                RawTransactionWithData::MultiAgent { raw_txn, .. }
                | RawTransactionWithData::MultiAgentWithFeePayer { raw_txn, .. },
            ) => raw_txn,
        }
    }

    /// Secondary signer addresses; empty for simple transactions.
    #[must_use]
    pub fn secondary_signer_addresses(&self) -> &[AccountAddress] {
        match self {
            Self::Simple(_) => &[],
            Self::WithData(
                RawTransactionWithData::MultiAgent {
                    secondary_signer_addresses,
                    ..
                }
                | RawTransactionWithData::MultiAgentWithFeePayer {
                    secondary_signer_addresses,
                    ..
                },
            ) => secondary_signer_addresses,
        }
    }

    /// The fee payer address, for sponsored transactions.
    #[must_use]
    pub const fn fee_payer_address(&self) -> Option<&AccountAddress> {
        match self {
            Self::WithData(RawTransactionWithData::MultiAgentWithFeePayer {
                fee_payer_address,
                ..
            }) => Some(fee_payer_address),
            Self::Simple(_) | Self::WithData(RawTransactionWithData::MultiAgent { .. }) => None,
        }
    }

    /// Name the sponsor of a fee-payer transaction. Returns `false` and
    /// changes nothing for other topologies.
    pub fn set_fee_payer_address(&mut self, address: AccountAddress) -> bool {
        match self {
            Self::WithData(RawTransactionWithData::MultiAgentWithFeePayer {
                fee_payer_address,
                ..
            }) => {
                *fee_payer_address = address;
                true
            }
            Self::Simple(_) | Self::WithData(RawTransactionWithData::MultiAgent { .. }) => false,
        }
    }
}

/// The raw transaction alone for simple transactions, the tagged
/// with-data form otherwise.
impl Encode for AnyRawTransaction {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::Simple(raw_txn) => raw_txn.encode(serializer),
            Self::WithData(with_data) => with_data.encode(serializer),
        }
    }
}

/// A transaction ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The transaction.
    pub raw_txn: RawTransaction,
    /// Its authorization.
    pub authenticator: TransactionAuthenticator,
}

impl SignedTransaction {
    /// The committed transaction hash:
    /// `SHA3-256(SHA3-256("APTOS::Transaction") || 0x00 || BCS(self))`.
    ///
    /// The `0x00` selects the user-transaction variant of the chain's
    /// transaction enum.
    #[must_use]
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(DomainSeparator::TRANSACTION.prefix());
        hasher.update([0u8]);
        hasher.update(self.to_bcs_bytes());
        hasher.finalize().into()
    }

    /// Check every signature that can be checked offline.
    ///
    /// Keyless signatures and placeholder authenticators make this `false`.
    /// Sender and secondary signatures on a fee-payer transaction are
    /// accepted over either the named sponsor or `0x0`.
    #[must_use]
    pub fn verify(&self) -> bool {
        match &self.authenticator {
            TransactionAuthenticator::Ed25519 { .. }
            | TransactionAuthenticator::SingleSender { .. } => self
                .authenticator
                .sender()
                .verify(&self.raw_txn.signing_message()),
            TransactionAuthenticator::MultiAgent {
                sender,
                secondary_signer_addresses,
                secondary_signers,
            } => {
                let message = RawTransactionWithData::MultiAgent {
                    raw_txn: self.raw_txn.clone(),
                    secondary_signer_addresses: secondary_signer_addresses.clone(),
                }
                .signing_message();
                secondary_signers.len() == secondary_signer_addresses.len()
                    && iter::once(sender)
                        .chain(secondary_signers)
                        .all(|auth| auth.verify(&message))
            }
            TransactionAuthenticator::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer,
            } => {
                let message_for = |fee_payer_address| {
                    RawTransactionWithData::MultiAgentWithFeePayer {
                        raw_txn: self.raw_txn.clone(),
                        secondary_signer_addresses: secondary_signer_addresses.clone(),
                        fee_payer_address,
                    }
                    .signing_message()
                };
                let named = message_for(*fee_payer_address);
                let unnamed = message_for(AccountAddress::ZERO);
                secondary_signers.len() == secondary_signer_addresses.len()
                    && fee_payer_signer.verify(&named)
                    && iter::once(sender)
                        .chain(secondary_signers)
                        .all(|auth| auth.verify(&named) || auth.verify(&unnamed))
            }
        }
    }
}

impl Encode for SignedTransaction {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.raw_txn.encode(serializer);
        self.authenticator.encode(serializer);
    }
}

impl Decode for SignedTransaction {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            raw_txn: deserializer.deserialize()?,
            authenticator: deserializer.deserialize()?,
        })
    }
}
