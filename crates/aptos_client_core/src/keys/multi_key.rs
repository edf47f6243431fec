//! ## MultiKey: K-of-N over keys of any scheme
//!
//! A [`MultiKey`] is an ordered list of up to 32 [`AnyPublicKey`]s plus a
//! threshold. A [`MultiKeySignature`] carries the signatures of the keys
//! that signed together with a 4-byte bitmap naming them.
//!
//! Bit $i$ of the bitmap is bit $7 - (i \bmod 8)$ of byte $\lfloor i/8
//! \rfloor$ (MSB-first). Reading the set bits in ascending order pairs
//! them one-to-one with the signatures:
//!
//! ```text
//! keys:       [k0, k1, k2]        threshold 2
//! bitmap:     1010_0000 0 0 0     signers {0, 2}
//! signatures: [sig(k0), sig(k2)]
//! ```

use bitvec::{array::BitArray, order::Msb0};

use super::{
    AnyPublicKey, AnySignature, Verifier,
    auth_key::{AuthenticationKey, AuthenticationKeyScheme, Scheme},
};
use crate::{
    bcs::{self, Decode, DecodeError, Encode, decode_sized_bytes},
    constants::{MAX_MULTI_KEY_SIGNATURES, MULTI_KEY_BITMAP_LENGTH},
};

type Bitmap = BitArray<[u8; MULTI_KEY_BITMAP_LENGTH], Msb0>;

/// MultiKey construction failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MultiKeyError {
    /// More than 32 public keys.
    #[error("a multi-key holds at most 32 keys, got {0}")]
    TooManyKeys(usize),

    /// Threshold of zero or above the key count.
    #[error("threshold {threshold} is not within 1..={keys}")]
    InvalidThreshold {
        /// Requested threshold.
        threshold: u8,
        /// Number of keys.
        keys: usize,
    },

    /// A signer position of 32 or more.
    #[error("signer index {0} does not fit the 32-bit bitmap")]
    BitOutOfRange(u8),

    /// The same signer position twice.
    #[error("duplicate signer index {0}")]
    DuplicateBit(u8),

    /// Bitmap popcount differs from the number of signatures.
    #[error("bitmap names {bits} signers but {signatures} signatures were given")]
    SignatureCountMismatch {
        /// Set bits.
        bits: usize,
        /// Signatures given.
        signatures: usize,
    },

    /// Signer positions out of order.
    #[error("signer indices must be strictly ascending: {next} follows {previous}")]
    NonAscendingSigners {
        /// The earlier index.
        previous: u8,
        /// The index that did not exceed it.
        next: u8,
    },

    /// The key is not one of the multi-key's keys.
    #[error("public key is not part of the multi-key")]
    KeyNotFound,
}

/// A 4-byte bitmap with the given signer positions set.
///
/// Positions must be distinct and below 32.
pub fn create_bitmap(indices: &[u8]) -> Result<[u8; MULTI_KEY_BITMAP_LENGTH], MultiKeyError> {
    let mut bits = Bitmap::ZERO;
    for &index in indices {
        let position = usize::from(index);
        if position >= MAX_MULTI_KEY_SIGNATURES {
            return Err(MultiKeyError::BitOutOfRange(index));
        }
        if bits.replace(position, true) {
            return Err(MultiKeyError::DuplicateBit(index));
        }
    }
    Ok(bits.into_inner())
}

/// Number of set bits.
#[must_use]
pub fn bit_count(bitmap: &[u8; MULTI_KEY_BITMAP_LENGTH]) -> usize {
    Bitmap::new(*bitmap).count_ones()
}

/// K-of-N public keys of any scheme.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MultiKey {
    public_keys: Vec<AnyPublicKey>,
    signatures_required: u8,
}

impl MultiKey {
    /// `1 <= signatures_required <= public_keys.len() <= 32`.
    pub fn new(
        public_keys: Vec<AnyPublicKey>,
        signatures_required: u8,
    ) -> Result<Self, MultiKeyError> {
        if public_keys.len() > MAX_MULTI_KEY_SIGNATURES {
            return Err(MultiKeyError::TooManyKeys(public_keys.len()));
        }
        if signatures_required == 0 || usize::from(signatures_required) > public_keys.len() {
            return Err(MultiKeyError::InvalidThreshold {
                threshold: signatures_required,
                keys: public_keys.len(),
            });
        }
        Ok(Self {
            public_keys,
            signatures_required,
        })
    }

    /// The keys, in bitmap order.
    #[must_use]
    pub fn public_keys(&self) -> &[AnyPublicKey] {
        &self.public_keys
    }

    /// The threshold.
    #[must_use]
    pub const fn signatures_required(&self) -> u8 {
        self.signatures_required
    }

    /// Bitmap position of `public_key`.
    pub fn get_index(&self, public_key: &AnyPublicKey) -> Result<u8, MultiKeyError> {
        self.public_keys
            .iter()
            .position(|key| key == public_key)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or(MultiKeyError::KeyNotFound)
    }
}

impl Verifier for MultiKey {
    type Signature = MultiKeySignature;

    /// At least `signatures_required` signatures, each valid under the key
    /// its bit names.
    fn verify(&self, message: &[u8], signature: &MultiKeySignature) -> bool {
        let bits = Bitmap::new(signature.bitmap);
        if bits.count_ones() != signature.signatures.len() {
            tracing::warn!("multi-key bitmap does not match signature count");
            return false;
        }
        if bits.iter_ones().any(|index| index >= self.public_keys.len()) {
            tracing::warn!("multi-key bitmap names a key that does not exist");
            return false;
        }
        if signature.signatures.len() < usize::from(self.signatures_required) {
            return false;
        }
        bits.iter_ones().zip(&signature.signatures).all(|(index, sig)| {
            self.public_keys
                .get(index)
                .is_some_and(|key| key.verify(message, sig))
        })
    }
}

impl AuthenticationKeyScheme for MultiKey {
    fn auth_key(&self) -> AuthenticationKey {
        AuthenticationKey::from_scheme(Scheme::MultiKey, &self.to_bcs_bytes())
    }
}

impl Encode for MultiKey {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_vec(&self.public_keys);
        serializer.serialize_u8(self.signatures_required);
    }
}

impl Decode for MultiKey {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let public_keys = deserializer.deserialize_vec()?;
        let signatures_required = deserializer.deserialize_u8()?;
        Self::new(public_keys, signatures_required)
            .map_err(|err| DecodeError::invalid("MultiKey", err))
    }
}

/// Signatures from a subset of a [`MultiKey`]'s keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiKeySignature {
    signatures: Vec<AnySignature>,
    bitmap: [u8; MULTI_KEY_BITMAP_LENGTH],
}

impl MultiKeySignature {
    /// Pair signatures with a bitmap; the popcount must equal the number of
    /// signatures.
    pub fn new(
        signatures: Vec<AnySignature>,
        bitmap: [u8; MULTI_KEY_BITMAP_LENGTH],
    ) -> Result<Self, MultiKeyError> {
        let bits = bit_count(&bitmap);
        if bits != signatures.len() {
            return Err(MultiKeyError::SignatureCountMismatch {
                bits,
                signatures: signatures.len(),
            });
        }
        Ok(Self { signatures, bitmap })
    }

    /// Build from `(signer index, signature)` pairs.
    ///
    /// Indices must already be strictly ascending; they are never
    /// reordered, since the order decides which key checks which signature.
    pub fn from_signer_indices(
        signers: Vec<(u8, AnySignature)>,
    ) -> Result<Self, MultiKeyError> {
        for pair in signers.windows(2) {
            if let [(previous, _), (next, _)] = pair {
                if next <= previous {
                    return Err(MultiKeyError::NonAscendingSigners {
                        previous: *previous,
                        next: *next,
                    });
                }
            }
        }
        let (indices, signatures): (Vec<u8>, Vec<AnySignature>) = signers.into_iter().unzip();
        Self::new(signatures, create_bitmap(&indices)?)
    }

    /// The signatures, in ascending signer order.
    #[must_use]
    pub fn signatures(&self) -> &[AnySignature] {
        &self.signatures
    }

    /// The signer bitmap.
    #[must_use]
    pub const fn bitmap(&self) -> &[u8; MULTI_KEY_BITMAP_LENGTH] {
        &self.bitmap
    }

    /// Signer positions, ascending.
    #[must_use]
    pub fn signer_indices(&self) -> Vec<usize> {
        Bitmap::new(self.bitmap).iter_ones().collect()
    }
}

impl Encode for MultiKeySignature {
    fn encode(&self, serializer: &mut bcs::Serializer) {
        serializer.serialize_vec(&self.signatures);
        serializer.serialize_bytes(&self.bitmap);
    }
}

impl Decode for MultiKeySignature {
    fn decode(deserializer: &mut bcs::Deserializer<'_>) -> Result<Self, DecodeError> {
        let signatures = deserializer.deserialize_vec()?;
        let bitmap = decode_sized_bytes(deserializer, "MultiKeySignature bitmap")?;
        Self::new(signatures, bitmap).map_err(|err| DecodeError::invalid("MultiKeySignature", err))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;
    use crate::keys::{Ed25519PrivateKey, PrivateKey, Secp256k1PrivateKey, Signer as _};

    fn signers(rng: &mut StdRng) -> [PrivateKey; 3] {
        [
            Ed25519PrivateKey::generate(rng).into(),
            Secp256k1PrivateKey::generate(rng).into(),
            Ed25519PrivateKey::generate(rng).into(),
        ]
    }

    fn multi_key(keys: &[PrivateKey], threshold: u8) -> MultiKey {
        MultiKey::new(keys.iter().map(PrivateKey::public_key).collect(), threshold).unwrap()
    }

    #[test]
    fn bitmap_layout() {
        assert_eq!(create_bitmap(&[0]).unwrap(), [0x80, 0, 0, 0]);
        assert_eq!(create_bitmap(&[0, 9, 31]).unwrap(), [0x80, 0x40, 0, 0x01]);
        assert_eq!(bit_count(&[0x80, 0x40, 0, 0x01]), 3);
        assert_eq!(create_bitmap(&[]).unwrap(), [0; 4]);
    }

    #[test]
    fn bitmap_rejects_bad_positions() {
        assert_eq!(create_bitmap(&[32]), Err(MultiKeyError::BitOutOfRange(32)));
        assert_eq!(create_bitmap(&[3, 3]), Err(MultiKeyError::DuplicateBit(3)));
    }

    #[test]
    fn threshold_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let keys: Vec<_> = signers(&mut rng).iter().map(PrivateKey::public_key).collect();
        assert_eq!(
            MultiKey::new(keys.clone(), 0),
            Err(MultiKeyError::InvalidThreshold {
                threshold: 0,
                keys: 3
            })
        );
        assert_eq!(
            MultiKey::new(keys.clone(), 4),
            Err(MultiKeyError::InvalidThreshold {
                threshold: 4,
                keys: 3
            })
        );
        let too_many = vec![keys[0].clone(); 33];
        assert_eq!(
            MultiKey::new(too_many, 1),
            Err(MultiKeyError::TooManyKeys(33))
        );
    }

    /// Two keys, threshold one, signed by key 0.
    #[test]
    fn one_of_two() {
        let mut rng = StdRng::seed_from_u64(1);
        let keys = signers(&mut rng);
        let multi_key = multi_key(&keys[..2], 1);
        let sig = MultiKeySignature::from_signer_indices(vec![(0, keys[0].sign(b"msg"))]).unwrap();
        assert_eq!(sig.bitmap(), &[0x80, 0, 0, 0]);
        assert!(multi_key.verify(b"msg", &sig));
        assert!(!multi_key.verify(b"other", &sig));
    }

    #[test]
    fn popcount_mismatch() {
        let mut rng = StdRng::seed_from_u64(2);
        let keys = signers(&mut rng);
        let sig = keys[0].sign(b"msg");
        assert_eq!(
            MultiKeySignature::new(vec![sig], [0xc0, 0, 0, 0]),
            Err(MultiKeyError::SignatureCountMismatch {
                bits: 2,
                signatures: 1
            })
        );
    }

    /// Mixed schemes; the threshold counts signatures, and each signature is
    /// checked against the key its bit names.
    #[test]
    fn two_of_three_mixed_schemes() {
        let mut rng = StdRng::seed_from_u64(3);
        let keys = signers(&mut rng);
        let multi_key = multi_key(&keys, 2);
        let message = b"two of three";

        let good = MultiKeySignature::from_signer_indices(vec![
            (1, keys[1].sign(message)),
            (2, keys[2].sign(message)),
        ])
        .unwrap();
        assert_eq!(good.signer_indices(), vec![1, 2]);
        assert!(multi_key.verify(message, &good));

        let too_few =
            MultiKeySignature::from_signer_indices(vec![(1, keys[1].sign(message))]).unwrap();
        assert!(!multi_key.verify(message, &too_few));

        // right signatures, wrong bits
        let shifted = MultiKeySignature::new(good.signatures().to_vec(), [0xc0, 0, 0, 0]).unwrap();
        assert!(!multi_key.verify(message, &shifted));

        // a bit past the last key
        let beyond =
            MultiKeySignature::new(good.signatures().to_vec(), [0x20, 0x80, 0, 0]).unwrap();
        assert!(!multi_key.verify(message, &beyond));
    }

    #[test]
    fn signer_indices_must_ascend() {
        let mut rng = StdRng::seed_from_u64(4);
        let keys = signers(&mut rng);
        assert_eq!(
            MultiKeySignature::from_signer_indices(vec![
                (2, keys[2].sign(b"m")),
                (0, keys[0].sign(b"m")),
            ]),
            Err(MultiKeyError::NonAscendingSigners {
                previous: 2,
                next: 0
            })
        );
        assert_eq!(
            MultiKeySignature::from_signer_indices(vec![
                (1, keys[1].sign(b"m")),
                (1, keys[1].sign(b"m")),
            ]),
            Err(MultiKeyError::NonAscendingSigners {
                previous: 1,
                next: 1
            })
        );
    }

    #[test]
    fn get_index() {
        let mut rng = StdRng::seed_from_u64(5);
        let keys = signers(&mut rng);
        let multi_key = multi_key(&keys[..2], 2);
        assert_eq!(multi_key.get_index(&keys[1].public_key()), Ok(1));
        assert_eq!(
            multi_key.get_index(&keys[2].public_key()),
            Err(MultiKeyError::KeyNotFound)
        );
    }

    /// Keys vector, then the threshold byte; signatures vector, then the
    /// bitmap as length-prefixed bytes.
    #[test]
    fn wire_layout() {
        let key = Ed25519PrivateKey::from_bytes(&[9u8; 32]).unwrap();
        let public = AnyPublicKey::from(key.public_key());
        let multi_key = MultiKey::new(vec![public.clone(), public], 1).unwrap();
        let bytes = multi_key.to_bcs_bytes();
        assert_eq!(bytes.len(), 1 + 2 * 34 + 1);
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes[69], 1);
        assert_eq!(MultiKey::from_bcs_bytes(&bytes), Ok(multi_key));

        let sig = MultiKeySignature::from_signer_indices(vec![(0, key.sign(b"m").into())]).unwrap();
        let bytes = sig.to_bcs_bytes();
        assert_eq!(&bytes[bytes.len() - 5..], &[4, 0x80, 0, 0, 0]);
        assert_eq!(MultiKeySignature::from_bcs_bytes(&bytes), Ok(sig));
    }

    /// A decoded signature cannot smuggle in a popcount mismatch.
    #[test]
    fn decode_validates_popcount() {
        let key = Ed25519PrivateKey::from_bytes(&[9u8; 32]).unwrap();
        let mut bytes = bcs::to_bytes(&vec![AnySignature::from(key.sign(b"m"))]);
        bytes.extend_from_slice(&[4, 0xc0, 0, 0, 0]);
        assert!(matches!(
            MultiKeySignature::from_bcs_bytes(&bytes),
            Err(DecodeError::InvalidValue { .. })
        ));
    }
}
