//! MinHash signature computation with block reduction and the
//! signature-identifier fold, grounded in `inverseIndex.cpp::computeSignature`
//! and `computeSignatureMap`.

use crate::hash::{self, MAX_VALUE};
use std::ops::Deref;

/// A computed signature, `B = ceil(H / b) + 1` entries long. Wraps `Vec<u64>`
/// so call sites read naturally as slices while keeping a named type at API
/// boundaries, the way `seismic::PostingList` wraps its packed arrays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature(Vec<u64>);

impl Signature {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Signature {
    type Target = [u64];
    fn deref(&self) -> &[u64] {
        &self.0
    }
}

impl From<Vec<u64>> for Signature {
    fn from(v: Vec<u64>) -> Self {
        Signature(v)
    }
}

/// `B = ceil(H / b) + 1`, the fixed signature length for a given
/// `(number_of_hash_functions, block_size)` configuration.
pub fn signature_length(number_of_hash_functions: usize, block_size: usize) -> usize {
    assert!(block_size > 0, "block_size must be nonzero");
    number_of_hash_functions.div_ceil(block_size) + 1
}

/// Computes the per-instance MinHash signature: `H` per-hash-function minima
/// over the hashed features, block-reduced by folding `b` consecutive minima
/// into one. Empty feature vectors yield signatures of `MAX_VALUE` entries
/// (spec §4.2).
pub fn compute_signature(
    features: &[u32],
    number_of_hash_functions: usize,
    block_size: usize,
) -> Signature {
    if features.is_empty() {
        return vec![MAX_VALUE; signature_length(number_of_hash_functions, block_size)].into();
    }

    let mut minima = vec![MAX_VALUE; number_of_hash_functions];

    for (j, slot) in minima.iter_mut().enumerate() {
        let mut min_value = MAX_VALUE;
        for &feature in features {
            let hashed = hash_feature(feature, j);
            if hashed < min_value {
                min_value = hashed;
            }
        }
        *slot = min_value;
    }

    let mut reduced = Vec::with_capacity(number_of_hash_functions / block_size + 1);
    let mut k = 0;
    while k < number_of_hash_functions {
        let mut v = minima[k];
        let upper = (k + block_size).min(number_of_hash_functions);
        for &m in &minima[k..upper] {
            let scaled = (m.wrapping_mul(v) as f64) * hash::A;
            v = hash::mix(scaled.abs() as u64, MAX_VALUE);
        }
        reduced.push(v);
        k += block_size;
    }

    reduced.into()
}

#[inline]
fn hash_feature(feature: u32, hash_function: usize) -> u64 {
    // `_size_tHashSimple((f+1) * (j+1) * A, MAX)` in the source: the raw
    // mixing function is invoked directly on the `A`-scaled key, bypassing
    // the seeded `hash()` wrapper entirely (`computeSignature` never threads
    // a seed through this call).
    let scaled = (feature as f64 + 1.0) * (hash_function as f64 + 1.0) * hash::A;
    hash::mix(scaled.abs() as u64, MAX_VALUE)
}

/// Folds over features to a single scalar signature-identifier, used to
/// collapse equivalent instances/queries for the duration of one fit/query
/// call (spec §4.2). `sid(∅) = 0`.
///
/// The fold multiplies the running `sid` back into the next key, so after a
/// couple of rounds it spans the full `u64` range; doing that multiplication
/// in `f64` (as the per-hash-function minima do, where the accumulator
/// stays small) would routinely overflow `f64`'s exact-integer range and
/// saturate on cast back to `u64`, collapsing distinct feature sets onto the
/// same id. Folding in `u64` via `wrapping_mul` first keeps the entropy the
/// hash mix depends on; `hash::hash`'s own `* A` scaling still applies to
/// the folded key.
pub fn signature_id(features: &[u32]) -> u64 {
    let mut sid: u64 = 0;
    for &feature in features {
        let key = (feature as u64 + 1).wrapping_mul(sid.wrapping_add(1));
        let scaled = (key as f64) * hash::A;
        sid = hash::mix(scaled.abs() as u64, MAX_VALUE);
    }
    sid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_length_matches_formula() {
        assert_eq!(signature_length(4, 2), 3);
        assert_eq!(signature_length(5, 2), 4);
        assert_eq!(signature_length(10, 3), 5);
    }

    #[test]
    fn deterministic_across_calls() {
        let a = compute_signature(&[3, 7, 9], 4, 2);
        let b = compute_signature(&[3, 7, 9], 4, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_features_yield_max_value_signature() {
        let sig = compute_signature(&[], 4, 2);
        assert!(sig.iter().all(|&v| v == MAX_VALUE));
    }

    #[test]
    fn signature_id_deterministic() {
        assert_eq!(signature_id(&[1, 2, 3]), signature_id(&[1, 2, 3]));
        assert_ne!(signature_id(&[1, 2, 3]), signature_id(&[1, 2, 4]));
    }

    #[test]
    fn empty_signature_id_is_zero() {
        assert_eq!(signature_id(&[]), 0);
    }
}
