//! `BloomierFilter`: the XOR-resolved compact `key -> PostingList` table,
//! grounded in `bloomierFilter.cpp`. The most algorithmically delicate piece
//! of the crate per spec §1.

use super::encoder::Encoder;
use super::hash::BloomierHash;
use super::order_and_match::OrderAndMatchFinder;
use crate::posting_list::PostingList;

/// Bounded-retry constant for `get`/`set` lookups (spec §4.7, §9: "the
/// `tries = 5` constant is a false-positive/false-negative trade-off").
const DEFAULT_TRIES: u8 = 5;

#[derive(Debug, Clone)]
pub struct BloomierFilter {
    hash: BloomierHash,
    finder: OrderAndMatchFinder,
    encoder: Encoder,
    /// `T[0..m)`: per-slot XOR-encoded bit-vectors.
    table: Vec<Vec<u8>>,
    /// `V[0..m)`: per-slot posting lists, `None` when the slot is unused.
    value_table: Vec<Option<PostingList>>,
    max_bin_size: usize,
    tries: u8,
}

impl BloomierFilter {
    /// `m`: table size, `k`: neighbors per key, `q`: value bit-width,
    /// `seed`: default hash seed — exactly the parameters
    /// `InverseIndexStorageBloomierFilter`/`BloomierStorage` constructs each
    /// per-component filter with (spec §4.8: `m=3500, K=2, q=8, seed=100`).
    pub fn new(m: usize, k: usize, q: usize, seed: u64, max_bin_size: usize) -> Self {
        let byte_width = q.div_ceil(8);
        Self {
            hash: BloomierHash::new(m, k, byte_width, seed),
            finder: OrderAndMatchFinder::new(m),
            encoder: Encoder::new(byte_width),
            table: vec![vec![0u8; byte_width]; m],
            value_table: vec![None; m],
            max_bin_size,
            tries: DEFAULT_TRIES,
        }
    }

    fn xor_into(target: &mut [u8], other: &[u8]) {
        for (t, o) in target.iter_mut().zip(other) {
            *t ^= o;
        }
    }

    /// Presupposes `OrderAndMatchFinder::find` has already admitted `key`.
    /// Implements spec §4.7's `create`: compute the singleton slot `L`,
    /// XOR-encode the chosen index against the key's mask and the table
    /// entries of its other neighbors, and record `value` at `V[L]`.
    pub fn create(&mut self, key: u64, value: u32) {
        if !self.finder.find(&[key], &self.hash) {
            // Batch of one was rejected (pi/tau length mismatch never
            // actually happens for a singleton batch, but guard per §4.5).
            return;
        }
        let pi_index = self.finder.pi().len() - 1;
        if pi_index >= self.finder.tau().len() {
            // Should never happen if invariants hold (spec §4.7's silent
            // failure mode); guarded defensively.
            return;
        }
        let neighbors = self.finder.neighborhood_for(key, &self.hash);
        let l = self.finder.tau()[pi_index];
        let slot = neighbors[l];

        let encoded = self.encoder.encode(l);
        let mask = self.hash.mask(key);
        let mut cell = vec![0u8; self.encoder.byte_width()];
        for i in 0..cell.len() {
            cell[i] = encoded[i] ^ mask[i];
        }
        for (j, &n) in neighbors.iter().enumerate() {
            if j != l {
                let other = self.table[n].clone();
                Self::xor_into(&mut cell, &other);
            }
        }
        self.table[slot] = cell;

        match &mut self.value_table[slot] {
            None => self.value_table[slot] = Some(PostingList::singleton(value)),
            Some(list) => {
                // spec §4.7 step 4: "otherwise append to existing list
                // subject to admission rules" — a later key can land its
                // singleton slot on a `V[L]` another key already occupies.
                // A disabled cell stays disabled (spec §9).
                if !list.is_disabled() {
                    list.push_checked(value, self.max_bin_size);
                }
            }
        }
    }

    /// Bounded-retry lookup (spec §4.7's `get`): tries successive seeds
    /// starting at the filter's default seed, decoding which neighbor slot
    /// is supposed to hold the value and returning it if present. Returns
    /// `None`, never panics, on exhaustion — wrong-answer false positives for
    /// unregistered keys are a documented, tolerated mode (the calling layer
    /// filters candidates against the real query at scoring time).
    pub fn get(&self, key: u64) -> Option<&PostingList> {
        let mask = self.hash.mask(key);
        for i in 0..self.tries {
            let seed = self.hash.default_seed().wrapping_add(i as u64);
            let neighbors = self.hash.neighbors(key, seed);
            let mut value = mask.clone();
            for &n in &neighbors {
                if n < self.table.len() {
                    Self::xor_into(&mut value, &self.table[n]);
                }
            }
            let h = self.encoder.decode(&value);
            if h < neighbors.len() {
                let slot = neighbors[h];
                if let Some(list) = &self.value_table[slot] {
                    return Some(list);
                }
            }
        }
        None
    }

    /// `set` (spec §4.7): append to an existing admissible cell found via
    /// `get`'s lookup procedure; otherwise `create` a new one. Respects the
    /// overflow/disabled-cell rule — once a cell crosses `max_bin_size` it
    /// clears and stays disabled on subsequent inserts (spec §9's preserved
    /// "bug-compatible" behavior).
    pub fn set(&mut self, key: u64, value: u32) {
        let mask = self.hash.mask(key);
        for i in 0..self.tries {
            let seed = self.hash.default_seed().wrapping_add(i as u64);
            let neighbors = self.hash.neighbors(key, seed);
            let mut v = mask.clone();
            for &n in &neighbors {
                if n < self.table.len() {
                    Self::xor_into(&mut v, &self.table[n]);
                }
            }
            let h = self.encoder.decode(&v);
            if h < neighbors.len() {
                let slot = neighbors[h];
                if slot < self.value_table.len() {
                    match &mut self.value_table[slot] {
                        None => continue,
                        Some(list) => {
                            if list.is_disabled() {
                                // Stays disabled; admission branch is taken
                                // but the append is skipped (spec §9).
                                return;
                            }
                            list.push_checked(value, self.max_bin_size);
                            return;
                        }
                    }
                }
            }
        }
        self.create(key, value);
    }

    /// Number of occupied `V` slots (distinct stored values), used by
    /// `storage::bloomier` to implement `InverseIndexStorage::len`.
    pub fn len(&self) -> usize {
        self.value_table.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears `V` slots whose posting list has `<= threshold` entries. Safe
    /// to call without touching `T`: the XOR resolution table is independent
    /// of which slots currently hold a value.
    pub fn prune(&mut self, threshold: usize) {
        for slot in self.value_table.iter_mut() {
            if let Some(list) = slot {
                if list.len() <= threshold {
                    *slot = None;
                }
            }
        }
    }

    /// Sizes of every occupied `V` slot, for distribution reporting and the
    /// μ+σ hash-function-pruning rule.
    pub fn posting_list_sizes(&self) -> Vec<usize> {
        self.value_table
            .iter()
            .filter_map(|v| v.as_ref().map(PostingList::len))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_insert_and_get() {
        let mut filter = BloomierFilter::new(3500, 2, 8, 100, 50);
        filter.set(17, 99);
        let result = filter.get(17).expect("value should be present");
        assert!(result.ids().contains(&99));
    }

    #[test]
    fn unregistered_key_returns_none_or_false_positive_never_panics() {
        let filter = BloomierFilter::new(3500, 2, 8, 100, 50);
        // No panics, that's the contract; value may be None or a
        // false-positive hit on an unrelated slot.
        let _ = filter.get(123456);
    }

    #[test]
    fn many_keys_round_trip() {
        let mut filter = BloomierFilter::new(3500, 2, 8, 100, 50);
        for key in 0..300u64 {
            filter.set(key, key as u32);
        }
        let mut hits = 0;
        for key in 0..300u64 {
            if let Some(list) = filter.get(key) {
                if list.ids().contains(&(key as u32)) {
                    hits += 1;
                }
            }
        }
        // Not every key is guaranteed to survive table pressure at this
        // fill ratio, but the overwhelming majority must round-trip.
        assert!(hits as f32 / 300.0 > 0.9, "hits={hits}");
    }

    #[test]
    fn overflow_disables_cell() {
        let mut filter = BloomierFilter::new(3500, 2, 8, 100, 3);
        for v in 0..10u32 {
            filter.set(7, v);
        }
        // Either disabled (None) or a surviving small list; never panics
        // and never exceeds max_bin_size.
        if let Some(list) = filter.get(7) {
            assert!(list.len() <= 3);
        }
    }
}
