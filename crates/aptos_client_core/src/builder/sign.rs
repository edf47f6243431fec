//! Collecting signatures into a [`SignedTransaction`].

use tracing::debug;

use super::BuildError;
use crate::{
    account::AccountSigner,
    primitives::AccountAddress,
    transaction::{
        AccountAuthenticator, AnyRawTransaction, RawTransactionWithData, SignedTransaction,
        TransactionAuthenticator,
    },
};

fn expect_signer(expected: AccountAddress, signer: &dyn AccountSigner) -> Result<(), BuildError> {
    let actual = signer.address();
    if actual == expected {
        Ok(())
    } else {
        Err(BuildError::SignerMismatch { expected, actual })
    }
}

/// Sign `txn` with every party and wrap the result.
///
/// Signers must match the transaction's sender and secondary addresses, in
/// order. A fee payer's address replaces the `0x0` placeholder before
/// anyone signs. Without a fee payer, a fee-payer transaction is assembled
/// with a placeholder for simulation.
pub fn sign_and_build(
    mut txn: AnyRawTransaction,
    sender: &dyn AccountSigner,
    secondary_signers: &[&dyn AccountSigner],
    fee_payer: Option<&dyn AccountSigner>,
) -> Result<SignedTransaction, BuildError> {
    expect_signer(txn.raw_transaction().sender, sender)?;
    let addresses = txn.secondary_signer_addresses();
    if addresses.len() != secondary_signers.len() {
        return Err(BuildError::SecondarySignerCount {
            expected: addresses.len(),
            actual: secondary_signers.len(),
        });
    }
    for (address, signer) in addresses.iter().zip(secondary_signers) {
        expect_signer(*address, *signer)?;
    }
    if let Some(sponsor) = fee_payer {
        if !txn.set_fee_payer_address(sponsor.address()) {
            return Err(BuildError::UnexpectedFeePayer);
        }
    }

    let sender_auth = sender.sign_transaction(&txn)?;
    let secondary_auths = secondary_signers
        .iter()
        .map(|signer| signer.sign_transaction(&txn))
        .collect::<Result<Vec<_>, _>>()?;
    let fee_payer_auth = fee_payer
        .map(|signer| signer.sign_transaction(&txn))
        .transpose()?;
    assemble(txn, sender_auth, secondary_auths, fee_payer_auth)
}

/// Wrap authenticators produced elsewhere, e.g. on separate devices.
///
/// Secondary authenticators follow the transaction's address order. A
/// missing fee payer authenticator becomes the placeholder.
pub fn assemble(
    txn: AnyRawTransaction,
    sender: AccountAuthenticator,
    secondary_signers: Vec<AccountAuthenticator>,
    fee_payer_signer: Option<AccountAuthenticator>,
) -> Result<SignedTransaction, BuildError> {
    let expected = txn.secondary_signer_addresses().len();
    if secondary_signers.len() != expected {
        return Err(BuildError::SecondarySignerCount {
            expected,
            actual: secondary_signers.len(),
        });
    }
    if fee_payer_signer.is_some() && txn.fee_payer_address().is_none() {
        return Err(BuildError::UnexpectedFeePayer);
    }

    let (raw_txn, authenticator) = match txn {
        AnyRawTransaction::Simple(raw_txn) => (raw_txn, TransactionAuthenticator::single(sender)),
        AnyRawTransaction::WithData(RawTransactionWithData::MultiAgent {
            raw_txn,
            secondary_signer_addresses,
        }) => (raw_txn, TransactionAuthenticator::MultiAgent {
            sender,
            secondary_signer_addresses,
            secondary_signers,
        }),
        AnyRawTransaction::WithData(RawTransactionWithData::MultiAgentWithFeePayer {
            raw_txn,
            secondary_signer_addresses,
            fee_payer_address,
        }) => {
            let fee_payer_auth =
                fee_payer_signer.unwrap_or(AccountAuthenticator::NoAccountAuthenticator);
            (raw_txn, TransactionAuthenticator::FeePayer {
                sender,
                secondary_signer_addresses,
                secondary_signers,
                fee_payer_address,
                fee_payer_signer: fee_payer_auth,
            })
        }
    };
    debug!(
        sender = %raw_txn.sender,
        authenticator = authenticator.variant_index(),
        "assembled signed transaction"
    );
    Ok(SignedTransaction {
        raw_txn,
        authenticator,
    })
}
