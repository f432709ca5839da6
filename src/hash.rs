//! Deterministic, seeded integer hashing used throughout the crate.
//!
//! The mixing chain (xor-shift, add, xor-shift, multiply, xor-shift) and the
//! pre-multiplication by `A = sqrt(2) - 1` are load-bearing for reproducing the
//! exact signature values the rest of the crate's invariants are stated over;
//! this is not meant to be cryptographically strong, only uniform and stable.

/// `A = sqrt(2) - 1`, pre-multiplied into every key before mixing.
pub const A: f64 = std::f64::consts::SQRT_2 - 1.0;

/// The sentinel "infinite" hash value, standing in for the original `size_t`
/// source's `MAX_VALUE` (its `SIZE_MAX`).
pub const MAX_VALUE: u64 = u64::MAX;

/// Mixes `key` and reduces it modulo `modulo`. `modulo == 0` is treated as "no
/// reduction" (returns the mixed value unchanged) so callers computing MinHash
/// minimums against `MAX_VALUE` never divide by zero.
///
/// Exposed `pub(crate)` because `signature::compute_signature` calls the raw
/// mix directly on an already `A`-scaled key, mirroring the source's
/// `Hash::_size_tHashSimple` being invoked straight from `computeSignature`
/// rather than through the seeded `hash()` wrapper — going through `hash()`
/// there would scale by `A` a second time and collapse small feature ids to
/// the same mixed value.
#[inline]
pub(crate) fn mix(mut key: u64, modulo: u64) -> u64 {
    key = (!key).wrapping_add(key << 15);
    key ^= key >> 12;
    key = key.wrapping_add(key << 2);
    key ^= key >> 4;
    key = key.wrapping_mul(2057);
    key ^= key >> 16;
    if modulo == 0 {
        key
    } else {
        key % modulo
    }
}

/// `h(key, modulo, seed) -> [0, modulo)`, seeded and `A`-scaled.
#[inline]
pub fn hash(key: u64, modulo: u64, seed: u64) -> u64 {
    let scaled = (key as f64) * (seed as f64) * A;
    // Matches the source's `(double) -> size_t` narrowing cast: truncate
    // toward zero, wrapping is acceptable since only the low bits feed the
    // mixing chain and uniformity, not magnitude, is the contract.
    let truncated = scaled.abs() as u64;
    mix(truncated, modulo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(hash(42, 1000, 7), hash(42, 1000, 7));
    }

    #[test]
    fn seed_changes_value_with_high_probability() {
        let a = hash(42, u64::MAX, 1);
        let b = hash(42, u64::MAX, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn respects_modulo_bound() {
        for seed in 0..50u64 {
            assert!(hash(12345, 97, seed) < 97);
        }
    }
}
