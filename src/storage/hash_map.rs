//! Hash-map-backed `InverseIndexStorage`, grounded in
//! `inverseIndexStorageUnorderedMap.cpp`.

use super::InverseIndexStorage;
use crate::distribution::ComponentStats;
use crate::posting_list::PostingList;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct HashMapStorage {
    cells: HashMap<u64, PostingList>,
    max_bin_size: usize,
    /// If nonzero, hash values are masked with this many low bits forced to
    /// one before indexing, collapsing near-duplicate signature values
    /// (spec §6's `remove_value_with_least_significant_bit`).
    remove_value_with_least_significant_bit: u32,
}

impl HashMapStorage {
    pub fn new(max_bin_size: usize, remove_value_with_least_significant_bit: u32) -> Self {
        Self {
            cells: HashMap::new(),
            max_bin_size,
            remove_value_with_least_significant_bit,
        }
    }

    /// Applies the least-significant-bit collapsing rule (spec §6); returns
    /// `None` if the masked value collapses to the all-ones sentinel, which
    /// the original source treats as "drop this insert" (see
    /// `inverseIndexStorageUnorderedMap.cpp::insert`).
    fn masked_value(&self, value: u64) -> Option<u64> {
        if self.remove_value_with_least_significant_bit == 0 {
            return Some(value);
        }
        let mask = u64::MAX << self.remove_value_with_least_significant_bit;
        let masked = value | !mask;
        if masked == !mask {
            None
        } else {
            Some(masked)
        }
    }
}

impl InverseIndexStorage for HashMapStorage {
    fn get(&self, value: u64) -> Option<&PostingList> {
        self.cells.get(&value)
    }

    fn insert(&mut self, value: u64, id: u32) {
        let Some(value) = self.masked_value(value) else {
            return;
        };
        match self.cells.get_mut(&value) {
            Some(list) => {
                if !list.is_disabled() {
                    list.push_checked(id, self.max_bin_size);
                }
            }
            None => {
                self.cells.insert(value, PostingList::singleton(id));
            }
        }
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn prune(&mut self, threshold: usize) {
        self.cells.retain(|_, list| list.len() > threshold);
    }

    fn stats(&self) -> ComponentStats {
        ComponentStats::from_sizes(&self.cell_sizes())
    }

    fn cell_sizes(&self) -> Vec<usize> {
        self.cells.values().map(|l| l.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disables_on_overflow_and_stays_disabled() {
        let mut storage = HashMapStorage::new(3, 0);
        for id in 0..10 {
            storage.insert(5, id);
        }
        let cell = storage.get(5).unwrap();
        assert!(cell.is_disabled());
    }

    #[test]
    fn prune_drops_small_lists() {
        let mut storage = HashMapStorage::new(100, 0);
        for (value, count) in [(1u64, 1), (2, 2), (3, 3), (4, 4), (5, 5)] {
            for id in 0..count {
                storage.insert(value, id);
            }
        }
        storage.prune(2);
        let remaining: Vec<u64> = (1..=5).filter(|v| storage.get(*v).is_some()).collect();
        assert_eq!(remaining, vec![3, 4, 5]);
    }
}
