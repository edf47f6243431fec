//! The keyless signature envelope.
//!
//! ```text
//! KeylessSignature
//! ├── ephemeral_certificate: EphemeralCertificate::ZeroKnowledgeSig
//! │   └── ZeroKnowledgeSig { proof: ZkProof::Groth16, exp_horizon_secs, .. }
//! ├── jwt_header            (decoded JSON)
//! ├── exp_date_secs         (ephemeral key expiry)
//! ├── ephemeral_public_key
//! └── ephemeral_signature   (over the transaction and proof)
//! ```

use super::{EphemeralPublicKey, EphemeralSignature};
use crate::{
    bcs::{self, Decode, DecodeError, Encode},
    keys::Verifier as _,
};

/// A Groth16 proof over BN254: compressed $A \in G_1$, $B \in G_2$,
/// $C \in G_1$.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Groth16Proof {
    a: [u8; 32],
    b: [u8; 64],
    c: [u8; 32],
}

impl Groth16Proof {
    /// Wrap compressed points as produced by the prover service.
    #[must_use]
    pub const fn new(a: [u8; 32], b: [u8; 64], c: [u8; 32]) -> Self {
        Self { a, b, c }
    }

    /// $A$.
    #[must_use]
    pub const fn a(&self) -> &[u8; 32] {
        &self.a
    }

    /// $B$.
    #[must_use]
    pub const fn b(&self) -> &[u8; 64] {
        &self.b
    }

    /// $C$.
    #[must_use]
    pub const fn c(&self) -> &[u8; 32] {
        &self.c
    }
}

impl Encode for Groth16Proof {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_fixed_bytes(&self.a);
        serializer.serialize_fixed_bytes(&self.b);
        serializer.serialize_fixed_bytes(&self.c);
    }
}

impl Decode for Groth16Proof {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            a: deserializer.deserialize_fixed_bytes()?,
            b: deserializer.deserialize_fixed_bytes()?,
            c: deserializer.deserialize_fixed_bytes()?,
        })
    }
}

/// A zero-knowledge proof, tagged by proof system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZkProof {
    /// Tag 0.
    Groth16(Groth16Proof),
}

impl Encode for ZkProof {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::Groth16(proof) => {
                serializer.serialize_variant(0);
                proof.encode(serializer);
            }
        }
    }
}

impl Decode for ZkProof {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::Groth16),
            tag => Err(DecodeError::UnknownVariant {
                type_name: "ZkProof",
                tag,
            }),
        }
    }
}

/// A proof that a JWT binds the ephemeral key to the account's identity
/// commitment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ZeroKnowledgeSig {
    /// The proof.
    pub proof: ZkProof,
    /// How far past the JWT's `iat` the ephemeral key may live.
    pub exp_horizon_secs: u64,
    /// An extra JWT field revealed by the proof, as `"name":value`.
    pub extra_field: Option<String>,
    /// Audience override used during account recovery.
    pub override_aud_val: Option<String>,
    /// Signature by the training-wheels key over the proof.
    pub training_wheels_signature: Option<EphemeralSignature>,
}

impl ZeroKnowledgeSig {
    /// A proof with no optional fields set.
    #[must_use]
    pub const fn new(proof: ZkProof, exp_horizon_secs: u64) -> Self {
        Self {
            proof,
            exp_horizon_secs,
            extra_field: None,
            override_aud_val: None,
            training_wheels_signature: None,
        }
    }
}

impl Encode for ZeroKnowledgeSig {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.proof.encode(serializer);
        serializer.serialize_u64(self.exp_horizon_secs);
        self.extra_field.encode(serializer);
        self.override_aud_val.encode(serializer);
        self.training_wheels_signature.encode(serializer);
    }
}

impl Decode for ZeroKnowledgeSig {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            proof: deserializer.deserialize()?,
            exp_horizon_secs: deserializer.deserialize_u64()?,
            extra_field: deserializer.deserialize_option()?,
            override_aud_val: deserializer.deserialize_option()?,
            training_wheels_signature: deserializer.deserialize_option()?,
        })
    }
}

/// What certifies the ephemeral key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EphemeralCertificate {
    /// Tag 0.
    ZeroKnowledgeSig(ZeroKnowledgeSig),
}

impl Encode for EphemeralCertificate {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        match self {
            Self::ZeroKnowledgeSig(sig) => {
                serializer.serialize_variant(0);
                sig.encode(serializer);
            }
        }
    }
}

impl Decode for EphemeralCertificate {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        match deserializer.deserialize_variant()? {
            0 => deserializer.deserialize().map(Self::ZeroKnowledgeSig),
            // 1 is the OpenID signature path, which exposes the JWT
            tag => Err(DecodeError::UnknownVariant {
                type_name: "EphemeralCertificate",
                tag,
            }),
        }
    }
}

/// A keyless signature: an ephemeral signature plus the certificate tying
/// the ephemeral key to the account.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeylessSignature {
    /// Proof the ephemeral key belongs to the account.
    pub ephemeral_certificate: EphemeralCertificate,
    /// The decoded JWT header, used on chain to select the JWK.
    pub jwt_header: String,
    /// Expiry of the ephemeral key.
    pub exp_date_secs: u64,
    /// The ephemeral key.
    pub ephemeral_public_key: EphemeralPublicKey,
    /// The ephemeral key's signature.
    pub ephemeral_signature: EphemeralSignature,
}

impl KeylessSignature {
    /// The zero-knowledge proof, if the certificate carries one.
    #[must_use]
    pub const fn zk_proof(&self) -> Option<&ZkProof> {
        match &self.ephemeral_certificate {
            EphemeralCertificate::ZeroKnowledgeSig(sig) => Some(&sig.proof),
        }
    }

    /// Check the ephemeral signature over `message`.
    ///
    /// This is only the half of keyless verification that needs no chain
    /// state; the proof and JWK are checked by validators.
    #[must_use]
    pub fn verify_ephemeral(&self, message: &[u8]) -> bool {
        self.ephemeral_public_key
            .verify(message, &self.ephemeral_signature)
    }
}

impl Encode for KeylessSignature {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        self.ephemeral_certificate.encode(serializer);
        serializer.serialize_str(&self.jwt_header);
        serializer.serialize_u64(self.exp_date_secs);
        self.ephemeral_public_key.encode(serializer);
        self.ephemeral_signature.encode(serializer);
    }
}

impl Decode for KeylessSignature {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ephemeral_certificate: deserializer.deserialize()?,
            jwt_header: deserializer.deserialize_str()?,
            exp_date_secs: deserializer.deserialize_u64()?,
            ephemeral_public_key: deserializer.deserialize()?,
            ephemeral_signature: deserializer.deserialize()?,
        })
    }
}
