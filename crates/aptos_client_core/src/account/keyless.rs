//! Keyless accounts.
//!
//! A keyless account is assembled after an OIDC login: the JWT names the
//! user, the pepper hides who that user is on chain, the ephemeral key pair
//! signs, and the zero-knowledge proof ties the ephemeral key to the JWT.
//! The account cannot sign once its ephemeral key expires; the user logs in
//! again with a new pair.

use tracing::trace;

use super::{AccountSigner, SigningError};
use crate::{
    constants::PEPPER_LENGTH,
    keyless::{
        EphemeralCertificate, EphemeralKeyPair, FederatedKeylessPublicKey, JwtClaims,
        KeylessError, KeylessPublicKey, KeylessSignature, ZeroKnowledgeSig, decode_jwt_header,
    },
    keys::{AnyPublicKey, AnySignature, AuthenticationKey, AuthenticationKeyScheme as _},
    primitives::{AccountAddress, now_secs},
    transaction::{AccountAuthenticator, AnyRawTransaction, signing::transaction_and_proof_message},
};

/// An account controlled through an OIDC provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeylessAccount {
    public_key: AnyPublicKey,
    ephemeral_key_pair: EphemeralKeyPair,
    uid_key: String,
    uid_val: String,
    aud: String,
    pepper: [u8; PEPPER_LENGTH],
    proof: ZeroKnowledgeSig,
    jwt_header: String,
    address: AccountAddress,
}

impl KeylessAccount {
    /// Assemble an account from a login.
    ///
    /// `uid_key` names the claim identifying the user, usually `sub`. If the
    /// JWT carries a nonce it must be the ephemeral key pair's nonce.
    pub fn from_jwt(
        jwt: &str,
        ephemeral_key_pair: EphemeralKeyPair,
        pepper: &[u8],
        proof: ZeroKnowledgeSig,
        uid_key: &str,
    ) -> Result<Self, KeylessError> {
        let claims = JwtClaims::from_jwt(jwt)?;
        if let Some(nonce) = claims.nonce() {
            if nonce != ephemeral_key_pair.nonce() {
                return Err(KeylessError::NonceMismatch {
                    jwt: nonce.to_owned(),
                    expected: ephemeral_key_pair.nonce().to_owned(),
                });
            }
        }
        let pepper_bytes = <[u8; PEPPER_LENGTH]>::try_from(pepper)
            .map_err(|_err| KeylessError::InvalidPepperLength(pepper.len()))?;
        let uid_val = claims.uid_val(uid_key)?;
        let aud = claims.aud()?;
        let public_key: AnyPublicKey =
            KeylessPublicKey::from_claims(claims.iss()?, uid_key, uid_val, aud, &pepper_bytes)?
                .into();
        let address = public_key.account_address();
        Ok(Self {
            public_key,
            ephemeral_key_pair,
            uid_key: uid_key.to_owned(),
            uid_val: uid_val.to_owned(),
            aud: aud.to_owned(),
            pepper: pepper_bytes,
            proof,
            jwt_header: decode_jwt_header(jwt)?,
            address,
        })
    }

    /// Switch to the federated scheme, whose JWKs are installed at
    /// `jwk_address`. The address is re-derived from the new key.
    #[must_use]
    pub fn federated(mut self, jwk_address: AccountAddress) -> Self {
        let keyless = match &self.public_key {
            AnyPublicKey::Keyless(key) => key.clone(),
            AnyPublicKey::FederatedKeyless(key) => key.keyless().clone(),
            // from_jwt only produces the two keyless schemes
            AnyPublicKey::Ed25519(_) | AnyPublicKey::Secp256k1(_) => return self,
        };
        self.public_key = FederatedKeylessPublicKey::new(jwk_address, keyless).into();
        self.address = self.public_key.account_address();
        self
    }

    /// Keep the account at a fixed address after key rotation.
    #[must_use]
    pub fn with_address(mut self, address: AccountAddress) -> Self {
        self.address = address;
        self
    }

    /// The keyless or federated keyless public key.
    #[must_use]
    pub const fn public_key(&self) -> &AnyPublicKey {
        &self.public_key
    }

    /// The ephemeral key pair.
    #[must_use]
    pub const fn ephemeral_key_pair(&self) -> &EphemeralKeyPair {
        &self.ephemeral_key_pair
    }

    /// Name of the identifying claim.
    #[must_use]
    pub fn uid_key(&self) -> &str {
        &self.uid_key
    }

    /// Value of the identifying claim.
    #[must_use]
    pub fn uid_val(&self) -> &str {
        &self.uid_val
    }

    /// The OAuth client id.
    #[must_use]
    pub fn aud(&self) -> &str {
        &self.aud
    }

    /// The pepper.
    #[must_use]
    pub const fn pepper(&self) -> &[u8; PEPPER_LENGTH] {
        &self.pepper
    }

    /// The proof tying the ephemeral key to the JWT.
    #[must_use]
    pub const fn proof(&self) -> &ZeroKnowledgeSig {
        &self.proof
    }

    /// A keyless signature over `message` at time `now_secs`.
    pub fn sign_at(&self, message: &[u8], now_secs: u64) -> Result<KeylessSignature, KeylessError> {
        let ephemeral_signature = self.ephemeral_key_pair.sign_at(message, now_secs)?;
        trace!(expiry = self.ephemeral_key_pair.expiry_date_secs(), "keyless signature");
        Ok(KeylessSignature {
            ephemeral_certificate: EphemeralCertificate::ZeroKnowledgeSig(self.proof.clone()),
            jwt_header: self.jwt_header.clone(),
            exp_date_secs: self.ephemeral_key_pair.expiry_date_secs(),
            ephemeral_public_key: *self.ephemeral_key_pair.public_key(),
            ephemeral_signature,
        })
    }

    /// Sign a transaction at time `now_secs`, binding the proof into the
    /// signed message.
    pub fn sign_transaction_at(
        &self,
        txn: &AnyRawTransaction,
        now_secs: u64,
    ) -> Result<AccountAuthenticator, KeylessError> {
        let message = transaction_and_proof_message(txn, Some(&self.proof.proof));
        Ok(self.authenticator(self.sign_at(&message, now_secs)?))
    }

    fn authenticator(&self, signature: KeylessSignature) -> AccountAuthenticator {
        AccountAuthenticator::SingleKey {
            public_key: self.public_key.clone(),
            signature: AnySignature::from(signature),
        }
    }
}

impl AccountSigner for KeylessAccount {
    fn address(&self) -> AccountAddress {
        self.address
    }

    fn auth_key(&self) -> AuthenticationKey {
        self.public_key.auth_key()
    }

    fn sign_message(&self, message: &[u8]) -> Result<AccountAuthenticator, SigningError> {
        Ok(self.authenticator(self.sign_at(message, now_secs())?))
    }

    fn sign_transaction(
        &self,
        txn: &AnyRawTransaction,
    ) -> Result<AccountAuthenticator, SigningError> {
        self.sign_transaction_at(txn, now_secs())
            .map_err(SigningError::from)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        keyless::{Groth16Proof, ZkProof, jwt::tests::encode_jwt},
        keys::Ed25519PrivateKey,
        primitives::{ChainId, Identifier},
        transaction::{EntryFunction, RawTransaction, SigningMessage as _},
    };

    const EXPIRY: u64 = 1_735_689_600;
    const NONCE: &str =
        "11143244187588389256105316974915166220303395167141986471130635957824920577209";

    fn pair() -> EphemeralKeyPair {
        let key = Ed25519PrivateKey::from_bytes(&[7u8; 32]).unwrap();
        EphemeralKeyPair::new(key, EXPIRY, &[0x2a; 31]).unwrap()
    }

    fn pepper() -> Vec<u8> {
        (0u8..31).collect()
    }

    fn proof() -> ZeroKnowledgeSig {
        ZeroKnowledgeSig::new(
            ZkProof::Groth16(Groth16Proof::new([1; 32], [2; 64], [3; 32])),
            10_000_000,
        )
    }

    fn jwt(nonce: &str) -> String {
        encode_jwt(
            r#"{"alg":"RS256","kid":"k1","typ":"JWT"}"#,
            &serde_json::json!({
                "iss": "https://accounts.google.com",
                "aud": "test-client-id",
                "sub": "test_user_123",
                "nonce": nonce,
            })
            .to_string(),
        )
    }

    fn account() -> KeylessAccount {
        KeylessAccount::from_jwt(&jwt(NONCE), pair(), &pepper(), proof(), "sub").unwrap()
    }

    /// A login whose ephemeral key expires at `expiry`.
    pub(crate) fn account_expiring_at(expiry: u64) -> KeylessAccount {
        let key = Ed25519PrivateKey::from_bytes(&[9u8; 32]).unwrap();
        let pair = EphemeralKeyPair::new(key, expiry, &[0x2a; 31]).unwrap();
        let jwt = jwt(pair.nonce());
        KeylessAccount::from_jwt(&jwt, pair, &pepper(), proof(), "sub").unwrap()
    }

    /// The commitment matches the one computed from the same claims.
    #[test]
    fn commits_to_claims() {
        let account = account();
        let AnyPublicKey::Keyless(key) = account.public_key() else {
            panic!("expected a keyless key");
        };
        assert_eq!(key.iss(), "https://accounts.google.com");
        assert_eq!(
            hex::encode(key.id_commitment()),
            "ad4c76cd1e514b73f75ea114a11486a67ffd81797d5ec6b3543b8e07a3f8c325"
        );
        assert_eq!(account.address(), account.auth_key().account_address());
        assert_eq!(account.uid_val(), "test_user_123");
        assert_eq!(account.aud(), "test-client-id");
    }

    #[test]
    fn rejects_foreign_nonce_and_bad_pepper() {
        assert_eq!(
            KeylessAccount::from_jwt(&jwt("123"), pair(), &pepper(), proof(), "sub"),
            Err(KeylessError::NonceMismatch {
                jwt: "123".to_owned(),
                expected: NONCE.to_owned(),
            })
        );
        assert_eq!(
            KeylessAccount::from_jwt(&jwt(NONCE), pair(), &[0; 30], proof(), "sub"),
            Err(KeylessError::InvalidPepperLength(30))
        );
        assert_eq!(
            KeylessAccount::from_jwt(&jwt(NONCE), pair(), &pepper(), proof(), "email"),
            Err(KeylessError::MissingClaim("email".to_owned()))
        );
    }

    /// Federation changes the scheme and with it the address.
    #[test]
    fn federated_address() {
        let plain = account();
        let federated = account().federated(AccountAddress::A);
        assert!(matches!(
            federated.public_key(),
            AnyPublicKey::FederatedKeyless(key) if *key.jwk_address() == AccountAddress::A
        ));
        assert_ne!(plain.address(), federated.address());
    }

    /// The ephemeral key signs the transaction and proof together.
    #[test]
    fn signs_transaction_and_proof() {
        let account = account();
        let raw = RawTransaction {
            sender: account.address(),
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
        let txn = AnyRawTransaction::new(raw, vec![], None);
        let auth = account.sign_transaction_at(&txn, EXPIRY - 1).unwrap();
        let AccountAuthenticator::SingleKey {
            signature: AnySignature::Keyless(signature),
            ..
        } = &auth
        else {
            panic!("expected a keyless signature");
        };
        let message = transaction_and_proof_message(&txn, Some(&proof().proof));
        assert!(signature.verify_ephemeral(&message));
        assert!(!signature.verify_ephemeral(&txn.signing_message()));
        assert_eq!(signature.exp_date_secs, EXPIRY);
        assert_eq!(signature.jwt_header, r#"{"alg":"RS256","kid":"k1","typ":"JWT"}"#);
        // keyless signatures are never accepted offline
        assert!(!auth.verify(&message));
    }

    #[test]
    fn expired_key_cannot_sign() {
        let account = account();
        assert_eq!(
            account.sign_at(b"m", EXPIRY + 1),
            Err(KeylessError::EphemeralKeyExpired {
                expiry_date_secs: EXPIRY,
                now_secs: EXPIRY + 1,
            })
        );
        // the fixed expiry is in the past
        assert!(matches!(
            account.sign_message(b"m"),
            Err(SigningError::Keyless(KeylessError::EphemeralKeyExpired { .. }))
        ));
    }
}
