//! ## Poseidon over BN254
//!
//! The circom-compatible instantiation used by the keyless circuits:
//! $x^5$ S-box, 8 full rounds split around a block of partial rounds, and
//! a width of $t = n + 1$ lanes for $n$ inputs with lane 0 as capacity.
//!
//! | phase          | rounds    | S-box lanes |
//! |----------------|-----------|-------------|
//! | full           | 4         | all         |
//! | partial        | $R_P(t)$  | lane 0      |
//! | full           | 4         | all         |
//!
//! Each round adds the round constants to every lane, applies the S-box and
//! multiplies the state by the MDS matrix. The digest is lane 0.
//!
//! Round constants and MDS matrices come from `light-poseidon`'s BN254 x5
//! tables, which cover $t \le 13$ (twelve inputs). Every arity the keyless
//! scheme hashes fits.
//!
//! ### Packing bytes
//!
//! Strings and byte strings enter the hash as BN254 scalars, 31 bytes per
//! scalar so a chunk never reaches the modulus. Inputs are zero-padded to a
//! fixed maximum first, so the scalar count depends only on the maximum and
//! not on the input; the `_with_len` variants append the original length
//! so padding cannot collide with trailing zeros.

use ark_bn254::Fr;
use ark_ff::{BigInteger as _, Field as _, PrimeField as _};
use light_poseidon::parameters::bn254_x5;
use num_bigint::BigUint;

use super::KeylessError;
use crate::constants::{BYTES_PACKED_PER_SCALAR, MAX_NUM_INPUT_SCALARS};

/// Full rounds on each side of the partial rounds.
const HALF_FULL_ROUNDS: usize = 4;

/// Full rounds in total.
const FULL_ROUNDS: usize = 2 * HALF_FULL_ROUNDS;

/// Partial rounds indexed by $t - 2$, for one to sixteen inputs.
const PARTIAL_ROUNDS: [usize; 16] = [
    56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68,
];

/// Largest input count with published constants.
pub const MAX_ARITY: usize = 12;

/// Round constants and MDS matrix for one state width.
struct Permutation {
    width: usize,
    partial_rounds: usize,
    ark: Vec<Fr>,
    mds: Vec<Vec<Fr>>,
}

impl Permutation {
    fn for_arity(arity: usize) -> Result<Self, KeylessError> {
        if arity == 0 || arity > MAX_ARITY {
            return Err(KeylessError::UnsupportedArity(arity));
        }
        let width = arity + 1;
        let partial_rounds = *PARTIAL_ROUNDS
            .get(arity - 1)
            .ok_or(KeylessError::UnsupportedArity(arity))?;
        let params = u8::try_from(width)
            .ok()
            .and_then(|lanes| bn254_x5::get_poseidon_parameters::<Fr>(lanes).ok())
            .ok_or(KeylessError::UnsupportedArity(arity))?;
        if params.ark.len() != width * (FULL_ROUNDS + partial_rounds)
            || params.mds.len() != width
        {
            return Err(KeylessError::UnsupportedArity(arity));
        }
        Ok(Self {
            width,
            partial_rounds,
            ark: params.ark,
            mds: params.mds,
        })
    }

    /// `ark` holds exactly one `width`-sized chunk per round.
    fn permute(&self, state: &mut [Fr]) {
        for (round, constants) in self.ark.chunks_exact(self.width).enumerate() {
            for (lane, constant) in state.iter_mut().zip(constants) {
                *lane += constant;
            }
            let full = round < HALF_FULL_ROUNDS || round >= HALF_FULL_ROUNDS + self.partial_rounds;
            // partial rounds only touch lane 0
            let lanes = if full { state.len() } else { 1 };
            state.iter_mut().take(lanes).for_each(sbox);
            self.mix(state);
        }
    }

    fn mix(&self, state: &mut [Fr]) {
        let mixed: Vec<Fr> = self
            .mds
            .iter()
            .map(|row| row.iter().zip(state.iter()).map(|(entry, lane)| *entry * lane).sum())
            .collect();
        state.copy_from_slice(&mixed);
    }
}

fn sbox(lane: &mut Fr) {
    let squared = lane.square();
    *lane *= squared.square();
}

/// Poseidon digest of one to [`MAX_ARITY`] scalars.
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, KeylessError> {
    let permutation = Permutation::for_arity(inputs.len())?;
    let mut state = Vec::with_capacity(permutation.width);
    state.push(Fr::ZERO);
    state.extend_from_slice(inputs);
    permutation.permute(&mut state);
    state
        .into_iter()
        .next()
        .ok_or(KeylessError::UnsupportedArity(inputs.len()))
}

/// Zero-pad `bytes` to `max_len` and split into 31-byte little-endian
/// scalars.
pub fn pad_and_pack_bytes(bytes: &[u8], max_len: usize) -> Result<Vec<Fr>, KeylessError> {
    if bytes.len() > max_len {
        return Err(KeylessError::InputTooLong {
            len: bytes.len(),
            max: max_len,
        });
    }
    let mut padded = bytes.to_vec();
    padded.resize(max_len, 0);
    let scalars: Vec<Fr> = padded
        .chunks(BYTES_PACKED_PER_SCALAR)
        .map(Fr::from_le_bytes_mod_order)
        .collect();
    if scalars.len() >= MAX_NUM_INPUT_SCALARS {
        return Err(KeylessError::InputTooLong {
            len: max_len,
            max: (MAX_NUM_INPUT_SCALARS - 1) * BYTES_PACKED_PER_SCALAR,
        });
    }
    Ok(scalars)
}

/// [`pad_and_pack_bytes`] followed by the unpadded length.
pub fn pad_and_pack_bytes_with_len(bytes: &[u8], max_len: usize) -> Result<Vec<Fr>, KeylessError> {
    let mut scalars = pad_and_pack_bytes(bytes, max_len)?;
    let len = u64::try_from(bytes.len()).map_err(|_err| KeylessError::InputTooLong {
        len: bytes.len(),
        max: max_len,
    })?;
    scalars.push(Fr::from(len));
    Ok(scalars)
}

/// Hash a byte string padded to `max_len`, length included.
pub fn hash_bytes_with_len(bytes: &[u8], max_len: usize) -> Result<Fr, KeylessError> {
    poseidon_hash(&pad_and_pack_bytes_with_len(bytes, max_len)?)
}

/// Hash a UTF-8 string padded to `max_len`, length included.
pub fn hash_str_to_field(text: &str, max_len: usize) -> Result<Fr, KeylessError> {
    hash_bytes_with_len(text.as_bytes(), max_len)
}

/// Read up to 32 little-endian bytes as a scalar, reduced mod $r$.
#[must_use]
pub fn scalar_from_le_bytes(bytes: &[u8]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// The canonical 32-byte little-endian encoding.
#[must_use]
pub fn scalar_to_le_bytes(scalar: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (slot, byte) in out.iter_mut().zip(scalar.into_bigint().to_bytes_le()) {
        *slot = byte;
    }
    out
}

/// The scalar as a base-10 integer string.
#[must_use]
pub fn scalar_to_decimal(scalar: &Fr) -> String {
    BigUint::from_bytes_le(&scalar.into_bigint().to_bytes_le()).to_str_radix(10)
}
