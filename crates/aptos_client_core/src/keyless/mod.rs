//! ## Keyless accounts
//!
//! A keyless account is controlled by an OpenID Connect identity instead
//! of a long-lived private key. The account's public key commits to the
//! identity without revealing it:
//!
//! $$\mathsf{idc} = \text{Poseidon}(\mathsf{pepper},\ H(\mathsf{aud}),\
//!   H(\mathsf{uid\_val}),\ H(\mathsf{uid\_key}))$$
//!
//! where $H$ packs a string into BN254 scalars and hashes them with
//! [`poseidon`]. The public key is $(\mathsf{iss}, \mathsf{idc})$.
//!
//! To sign, the user holds a short-lived [`EphemeralKeyPair`] whose
//! public key, expiry and blinder are folded into the OIDC `nonce`:
//!
//! $$\mathsf{nonce} = \text{Poseidon}(\text{pack}(\text{BCS}(\mathsf{epk}), 93)
//!   \,\|\, \mathsf{exp} \,\|\, \mathsf{blinder})$$
//!
//! The identity provider signs a JWT carrying that nonce; a Groth16 proof
//! ([`ZeroKnowledgeSig`]) shows the JWT binds the ephemeral key to
//! $\mathsf{idc}$ without revealing the JWT. A transaction is then signed
//! by the ephemeral key and shipped as a [`KeylessSignature`].
//!
//! ```mermaid
//! flowchart LR
//!     epk[EphemeralKeyPair] -- nonce --> jwt[JWT]
//!     jwt -- "iss, aud, sub" --> idc[id commitment]
//!     pepper --> idc
//!     idc --> pk[KeylessPublicKey]
//!     jwt & epk -- prover --> zk[ZeroKnowledgeSig]
//!     zk & epk -- sign --> sig[KeylessSignature]
//! ```

mod ephemeral;
pub(crate) mod jwt;
pub mod poseidon;
mod public;
mod signature;

// Re-exports: public API surface.
pub use ephemeral::{EphemeralKeyPair, EphemeralPublicKey, EphemeralSignature};
pub use jwt::{JwtClaims, decode_jwt_header};
pub use public::{FederatedKeylessPublicKey, KeylessPublicKey, compute_id_commitment};
pub use signature::{
    EphemeralCertificate, Groth16Proof, KeylessSignature, ZeroKnowledgeSig, ZkProof,
};

use crate::keys::KeyError;

/// Keyless construction and signing failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeylessError {
    /// Poseidon is only instantiated for a limited number of inputs.
    #[error("poseidon does not support {0} inputs")]
    UnsupportedArity(usize),

    /// Input longer than its padded maximum.
    #[error("input of {len} bytes exceeds the maximum of {max}")]
    InputTooLong {
        /// Input length.
        len: usize,
        /// Maximum length.
        max: usize,
    },

    /// Pepper of the wrong length.
    #[error("pepper must be 31 bytes, got {0}")]
    InvalidPepperLength(usize),

    /// Blinder of the wrong length.
    #[error("blinder must be 31 bytes, got {0}")]
    InvalidBlinderLength(usize),

    /// The ephemeral key pair is past its expiry.
    #[error("ephemeral key pair expired at {expiry_date_secs}, now {now_secs}")]
    EphemeralKeyExpired {
        /// Expiry, in seconds since the epoch.
        expiry_date_secs: u64,
        /// Time of the signing attempt.
        now_secs: u64,
    },

    /// The JWT is not three base64url segments of JSON.
    #[error("malformed jwt: {0}")]
    MalformedJwt(String),

    /// A claim the account needs is absent or not a string.
    #[error("jwt is missing the '{0}' claim")]
    MissingClaim(String),

    /// The JWT was issued for a different ephemeral key.
    #[error("jwt nonce '{jwt}' does not match the ephemeral key nonce '{expected}'")]
    NonceMismatch {
        /// Nonce claim of the JWT.
        jwt: String,
        /// Nonce of the ephemeral key pair.
        expected: String,
    },

    /// Key bytes inside a keyless structure.
    #[error(transparent)]
    Key(#[from] KeyError),
}
