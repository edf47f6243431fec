//! K-of-N accounts.
//!
//! The account holds the [`MultiKey`] and the members this caller
//! controls. A member is any single-key account, keyless included. Each
//! member is placed at the bitmap position of its public key, and members
//! are kept sorted by that position so signatures come out in the order
//! the chain checks them.
//!
//! Transactions are signed member by member, so a keyless member signs
//! the transaction together with its proof while key-backed members sign
//! the plain signing message.

use tracing::debug;

use super::{Account, AccountSigner, SigningError};
use crate::{
    keys::{
        AnyPublicKey, AnySignature, AuthenticationKey, AuthenticationKeyScheme as _, MultiKey,
        MultiKeySignature, multi_key::create_bitmap,
    },
    primitives::AccountAddress,
    transaction::{AccountAuthenticator, AnyRawTransaction},
};

/// The key a member signs under.
fn member_key(member: &Account) -> Result<AnyPublicKey, SigningError> {
    match member {
        Account::Ed25519(account) => Ok(AnyPublicKey::Ed25519(account.public_key())),
        Account::SingleKey(account) => Ok(account.public_key()),
        Account::Keyless(account) => Ok(account.public_key().clone()),
        Account::MultiKey(_) => Err(SigningError::UnsupportedMultiKeyMember),
    }
}

/// The signature inside a member's authenticator.
fn member_signature(auth: AccountAuthenticator) -> Result<AnySignature, SigningError> {
    match auth {
        AccountAuthenticator::Ed25519 { signature, .. } => Ok(AnySignature::Ed25519(signature)),
        AccountAuthenticator::SingleKey { signature, .. } => Ok(signature),
        AccountAuthenticator::MultiKey { .. } | AccountAuthenticator::NoAccountAuthenticator => {
            Err(SigningError::UnsupportedMultiKeyMember)
        }
    }
}

/// A MultiKey account with enough local members to meet its threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiKeyAccount {
    multi_key: MultiKey,
    signers: Vec<Account>,
    signer_indices: Vec<u8>,
    address: AccountAddress,
}

impl MultiKeyAccount {
    /// Place each member at its key's position.
    ///
    /// Fails if a member is itself a multi-key account, if its key is not
    /// part of `multi_key`, if two members share a key, or if there are
    /// fewer members than the threshold.
    pub fn new(multi_key: MultiKey, signers: Vec<Account>) -> Result<Self, SigningError> {
        let required = multi_key.signatures_required();
        if signers.len() < usize::from(required) {
            return Err(SigningError::NotEnoughSigners {
                required,
                provided: signers.len(),
            });
        }
        let mut placed = Vec::with_capacity(signers.len());
        for signer in signers {
            let index = multi_key.get_index(&member_key(&signer)?)?;
            placed.push((index, signer));
        }
        placed.sort_by_key(|(index, _)| *index);
        let (signer_indices, signers): (Vec<u8>, Vec<Account>) = placed.into_iter().unzip();
        // rejects the same key twice
        create_bitmap(&signer_indices)?;
        let address = multi_key.account_address();
        Ok(Self {
            multi_key,
            signers,
            signer_indices,
            address,
        })
    }

    /// Keep the account at a fixed address after key rotation.
    #[must_use]
    pub fn with_address(mut self, address: AccountAddress) -> Self {
        self.address = address;
        self
    }

    /// The multi-key.
    #[must_use]
    pub const fn multi_key(&self) -> &MultiKey {
        &self.multi_key
    }

    /// Local members, ascending by bitmap position.
    #[must_use]
    pub fn signers(&self) -> &[Account] {
        &self.signers
    }

    /// Bitmap positions of the local members, ascending.
    #[must_use]
    pub fn signer_indices(&self) -> &[u8] {
        &self.signer_indices
    }

    fn sign_with(
        &self,
        mut sign: impl FnMut(&Account) -> Result<AccountAuthenticator, SigningError>,
    ) -> Result<AccountAuthenticator, SigningError> {
        let mut signatures = Vec::with_capacity(self.signers.len());
        for (&index, signer) in self.signer_indices.iter().zip(&self.signers) {
            signatures.push((index, member_signature(sign(signer)?)?));
        }
        let signature = MultiKeySignature::from_signer_indices(signatures)?;
        debug!(
            signers = self.signers.len(),
            threshold = self.multi_key.signatures_required(),
            "multi-key signature"
        );
        Ok(AccountAuthenticator::MultiKey {
            public_key: self.multi_key.clone(),
            signature,
        })
    }
}

impl AccountSigner for MultiKeyAccount {
    fn address(&self) -> AccountAddress {
        self.address
    }

    fn auth_key(&self) -> AuthenticationKey {
        self.multi_key.auth_key()
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, SigningError> {
        self.sign_with(|signer| signer.sign_message(message))
    }

    fn sign_transaction(
        &self,
        txn: &AnyRawTransaction,
    ) -> Result<AccountAuthenticator, SigningError> {
        self.sign_with(|signer| signer.sign_transaction(txn))
    }
}

#[cfg(test)]
mod tests {
    use core::iter;

    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::{
        account::{Ed25519Account, SingleKeyAccount, keyless::tests::account_expiring_at},
        keyless::EphemeralKeyPair,
        keys::{MultiKeyError, Verifier as _},
        primitives::{ChainId, Identifier, now_secs},
        transaction::{
            EntryFunction, RawTransaction, SigningMessage as _,
            signing::transaction_and_proof_message,
        },
    };

    fn accounts(count: usize, seed: u64) -> Vec<SingleKeyAccount> {
        let mut rng = StdRng::seed_from_u64(seed);
        iter::repeat_with(|| SingleKeyAccount::generate_ed25519(&mut rng))
            .take(count)
            .collect()
    }

    fn members(accounts: &[SingleKeyAccount]) -> Vec<Account> {
        accounts.iter().cloned().map(Account::from).collect()
    }

    fn multi_key(accounts: &[SingleKeyAccount], threshold: u8) -> MultiKey {
        let keys = accounts.iter().map(SingleKeyAccount::public_key).collect();
        MultiKey::new(keys, threshold).unwrap()
    }

    fn transaction(sender: AccountAddress) -> AnyRawTransaction {
        let raw = RawTransaction {
            sender,
            sequence_number: 0,
            payload: EntryFunction::new(
                "0x1::aptos_account".parse().unwrap(),
                Identifier::new("transfer").unwrap(),
                vec![],
                vec![],
            )
            .unwrap()
            .into(),
            max_gas_amount: 1,
            gas_unit_price: 1,
            expiration_timestamp_secs: 1,
            chain_id: ChainId::LOCAL,
        };
        AnyRawTransaction::new(raw, vec![], None)
    }

    /// Signers given out of order are signed in bitmap order.
    #[test]
    fn signers_sorted_by_position() {
        let all = accounts(3, 1);
        let key = multi_key(&all, 2);
        let account = MultiKeyAccount::new(key, members(&[all[2].clone(), all[0].clone()]))
            .unwrap();
        assert_eq!(account.signer_indices(), &[0, 2]);
        assert_eq!(account.signers()[0], Account::from(all[0].clone()));

        let auth = account.sign_message(b"msg").unwrap();
        let AccountAuthenticator::MultiKey { signature, .. } = &auth else {
            panic!("expected a multi-key authenticator");
        };
        assert_eq!(signature.bitmap(), &[0b1010_0000, 0, 0, 0]);
        assert!(auth.verify(b"msg"));
        assert!(!auth.verify(b"other"));
    }

    #[test]
    fn below_threshold() {
        let all = accounts(3, 2);
        let key = multi_key(&all, 2);
        assert_eq!(
            MultiKeyAccount::new(key, members(&all[1..2])),
            Err(SigningError::NotEnoughSigners {
                required: 2,
                provided: 1,
            })
        );
    }

    #[test]
    fn foreign_or_repeated_signer() {
        let all = accounts(2, 3);
        let stranger = accounts(1, 4);
        let key = multi_key(&all, 1);
        assert_eq!(
            MultiKeyAccount::new(key.clone(), members(&stranger)),
            Err(SigningError::MultiKey(MultiKeyError::KeyNotFound))
        );
        assert_eq!(
            MultiKeyAccount::new(key, members(&[all[1].clone(), all[1].clone()])),
            Err(SigningError::MultiKey(MultiKeyError::DuplicateBit(1)))
        );
    }

    #[test]
    fn nested_multi_key_rejected() {
        let all = accounts(2, 6);
        let inner = MultiKeyAccount::new(multi_key(&all, 1), members(&all[..1])).unwrap();
        let outer = MultiKey::new(vec![all[0].public_key()], 1).unwrap();
        assert_eq!(
            MultiKeyAccount::new(outer, vec![inner.into()]),
            Err(SigningError::UnsupportedMultiKeyMember)
        );
    }

    /// The address comes from the multi-key, not from any one signer.
    #[test]
    fn address_from_multi_key() {
        let all = accounts(2, 5);
        let key = multi_key(&all, 1);
        let account = MultiKeyAccount::new(key.clone(), members(&all[..1])).unwrap();
        assert_eq!(account.address(), key.account_address());
        assert_ne!(account.address(), all[0].address());
        let rotated = account.with_address(AccountAddress::A);
        assert_eq!(rotated.address(), AccountAddress::A);
    }

    /// A 2-of-2 of a legacy Ed25519 key and a keyless login: each member
    /// signs the transaction the way it would alone.
    #[test]
    fn keyless_member_signs_with_proof() {
        let mut rng = StdRng::seed_from_u64(7);
        let ed25519 = Ed25519Account::generate(&mut rng);
        let ed25519_key = AnyPublicKey::Ed25519(ed25519.public_key());
        let keyless = account_expiring_at(EphemeralKeyPair::default_expiry(now_secs()));
        let key = MultiKey::new(
            vec![ed25519_key.clone(), keyless.public_key().clone()],
            2,
        )
        .unwrap();
        let account =
            MultiKeyAccount::new(key, vec![keyless.clone().into(), ed25519.into()]).unwrap();
        assert_eq!(account.signer_indices(), &[0, 1]);

        let txn = transaction(account.address());
        let AccountAuthenticator::MultiKey { signature, .. } =
            account.sign_transaction(&txn).unwrap()
        else {
            panic!("expected a multi-key authenticator");
        };
        let [first, second] = signature.signatures() else {
            panic!("expected two signatures");
        };
        assert!(
            ed25519_key.verify(&txn.signing_message(), first),
            "key-backed member signs the plain signing message"
        );
        let AnySignature::Keyless(keyless_signature) = second else {
            panic!("expected a keyless signature second");
        };
        let with_proof = transaction_and_proof_message(&txn, Some(&keyless.proof().proof));
        assert!(keyless_signature.verify_ephemeral(&with_proof));
        assert!(!keyless_signature.verify_ephemeral(&txn.signing_message()));
    }
}
