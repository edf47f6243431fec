//! Signing messages.
//!
//! A signer never signs bare BCS. Every message is
//!
//! $$
//! \mathsf{SHA3\text{-}256}(\texttt{"APTOS::"} \| \mathsf{name}) \| \mathsf{BCS}(x)
//! $$
//!
//! so a signature over one type can never be replayed as another.
//!
//! | signed value              | domain                           |
//! |---------------------------|----------------------------------|
//! | `RawTransaction`          | `APTOS::RawTransaction`          |
//! | `RawTransactionWithData`  | `APTOS::RawTransactionWithData`  |
//! | keyless transaction       | `APTOS::TransactionAndProof`     |

use tracing::trace;

use super::{AnyRawTransaction, RawTransaction, RawTransactionWithData};
use crate::{
    bcs::{self, Encode},
    constants::{DomainSeparator, InvalidDomainSeparator},
    keyless::ZkProof,
};

/// A value with a fixed signing domain.
pub trait SigningMessage {
    /// The bytes a signer signs.
    fn signing_message(&self) -> Vec<u8>;
}

fn prefixed(domain: &DomainSeparator<'_>, value: &impl Encode) -> Vec<u8> {
    let message = domain.with(&value.to_bcs_bytes());
    trace!(len = message.len(), "signing message");
    message
}

impl SigningMessage for RawTransaction {
    fn signing_message(&self) -> Vec<u8> {
        prefixed(&DomainSeparator::RAW_TRANSACTION, self)
    }
}

impl SigningMessage for RawTransactionWithData {
    fn signing_message(&self) -> Vec<u8> {
        prefixed(&DomainSeparator::RAW_TRANSACTION_WITH_DATA, self)
    }
}

impl SigningMessage for AnyRawTransaction {
    fn signing_message(&self) -> Vec<u8> {
        match self {
            Self::Simple(raw_txn) => raw_txn.signing_message(),
            Self::WithData(with_data) => with_data.signing_message(),
        }
    }
}

/// Prefix arbitrary bytes with the hash of `domain`, which must lie in the
/// `APTOS::` namespace.
pub fn signing_message(domain: &str, bytes: &[u8]) -> Result<Vec<u8>, InvalidDomainSeparator> {
    Ok(DomainSeparator::new(domain)?.with(bytes))
}

/// What a keyless ephemeral key signs: the transaction in its signing
/// topology followed by the optional proof, so the proof cannot be
/// swapped after signing.
#[must_use]
pub fn transaction_and_proof_message(txn: &AnyRawTransaction, proof: Option<&ZkProof>) -> Vec<u8> {
    let mut serializer = bcs::Serializer::new();
    txn.encode(&mut serializer);
    proof.encode(&mut serializer);
    let message = DomainSeparator::TRANSACTION_AND_PROOF.with(&serializer.into_bytes());
    trace!(len = message.len(), has_proof = proof.is_some(), "keyless signing message");
    message
}

#[cfg(test)]
mod tests {
    use sha3::{Digest as _, Sha3_256};

    use super::*;
    use crate::{
        keyless::Groth16Proof,
        primitives::{AccountAddress, ChainId, Identifier},
        transaction::{EntryFunction, TransactionPayload},
    };

    fn raw() -> RawTransaction {
        let payload = EntryFunction::new(
            "0x1::coin".parse().unwrap(),
            Identifier::new("transfer").unwrap(),
            vec![],
            vec![],
        )
        .unwrap();
        RawTransaction {
            sender: AccountAddress::ONE,
            sequence_number: 0,
            payload: TransactionPayload::EntryFunction(payload),
            max_gas_amount: 1,
            gas_unit_price: 1,
            expiration_timestamp_secs: 1,
            chain_id: ChainId::LOCAL,
        }
    }

    #[test]
    fn raw_transaction_domain() {
        let raw = raw();
        let message = raw.signing_message();
        let prefix: [u8; 32] = Sha3_256::digest(b"APTOS::RawTransaction").into();
        assert_eq!(&message[..32], &prefix);
        assert_eq!(&message[32..], raw.to_bcs_bytes().as_slice());
        assert_eq!(
            signing_message("APTOS::RawTransaction", &raw.to_bcs_bytes()),
            Ok(message)
        );
        assert!(signing_message("RawTransaction", b"").is_err());
    }

    /// Adding any signer changes the domain and the body.
    #[test]
    fn with_data_domain() {
        let simple = AnyRawTransaction::new(raw(), vec![], None);
        let sponsored = AnyRawTransaction::new(raw(), vec![], Some(AccountAddress::ZERO));
        let prefix: [u8; 32] = Sha3_256::digest(b"APTOS::RawTransactionWithData").into();
        assert_eq!(&sponsored.signing_message()[..32], &prefix);
        assert_ne!(simple.signing_message(), sponsored.signing_message());
    }

    #[test]
    fn proof_is_bound() {
        let txn = AnyRawTransaction::new(raw(), vec![], None);
        let proof = ZkProof::Groth16(Groth16Proof::new([1; 32], [2; 64], [3; 32]));
        let without = transaction_and_proof_message(&txn, None);
        let with = transaction_and_proof_message(&txn, Some(&proof));
        let prefix: [u8; 32] = Sha3_256::digest(b"APTOS::TransactionAndProof").into();
        assert_eq!(&without[..32], &prefix);
        assert_eq!(without.last(), Some(&0));
        assert_eq!(with.len(), without.len() + proof.to_bcs_bytes().len());
        assert_eq!(&with[..without.len() - 1], &without[..without.len() - 1]);
    }
}
