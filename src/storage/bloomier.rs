//! Bloomier-filter-backed `InverseIndexStorage`, grounded in
//! `inverseIndexStorageBloomierFilter.cpp`. Owns one `BloomierFilter` per
//! component with the fixed parameters spec §4.8 documents
//! (`m=3500, K=2, q=8, seed=100`), lazily constructed on first insert. Rust
//! ownership closes the source's destructor leak (spec §9) for free: dropping
//! a `BloomierStorage` drops its filter automatically.

use super::InverseIndexStorage;
use crate::bloomier::BloomierFilter;
use crate::distribution::ComponentStats;
use crate::posting_list::PostingList;

const M: usize = 3500;
const K: usize = 2;
const Q: usize = 8;
const SEED: u64 = 100;

#[derive(Debug, Clone, Default)]
pub struct BloomierStorage {
    filter: Option<BloomierFilter>,
    max_bin_size: usize,
}

impl BloomierStorage {
    pub fn new(max_bin_size: usize) -> Self {
        Self {
            filter: None,
            max_bin_size,
        }
    }
}

impl InverseIndexStorage for BloomierStorage {
    fn get(&self, value: u64) -> Option<&PostingList> {
        self.filter.as_ref().and_then(|f| f.get(value))
    }

    fn insert(&mut self, value: u64, id: u32) {
        let filter = self
            .filter
            .get_or_insert_with(|| BloomierFilter::new(M, K, Q, SEED, self.max_bin_size));
        filter.set(value, id);
    }

    fn len(&self) -> usize {
        self.filter.as_ref().map_or(0, BloomierFilter::len)
    }

    fn prune(&mut self, threshold: usize) {
        if let Some(filter) = self.filter.as_mut() {
            filter.prune(threshold);
        }
    }

    fn stats(&self) -> ComponentStats {
        ComponentStats::from_sizes(&self.cell_sizes())
    }

    fn cell_sizes(&self) -> Vec<usize> {
        self.filter
            .as_ref()
            .map(BloomierFilter::posting_list_sizes)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_constructs_filter_on_first_insert() {
        let storage = BloomierStorage::new(50);
        assert!(storage.filter.is_none());
        let mut storage = storage;
        storage.insert(17, 99);
        assert!(storage.filter.is_some());
        assert!(storage.get(17).unwrap().ids().contains(&99));
    }
}
