//! `InverseIndexStorage`: the per-hash-function table from signature-component
//! values to posting lists, in its two variants (hash-map, Bloomier-backed).
//! Grounded in `inverseIndexStorageUnorderedMap.cpp`/`inverseIndexStorageBloomierFilter.cpp`.

pub mod bloomier;
pub mod hash_map;

pub use bloomier::BloomierStorage;
pub use hash_map::HashMapStorage;

use crate::distribution::ComponentStats;
use crate::posting_list::PostingList;

/// One component's `value -> PostingList` table. Both variants make the same
/// admission/overflow/prune/drop guarantees; only the representation (real
/// hash map vs. Bloomier filter) differs.
pub trait InverseIndexStorage: Send + Sync {
    /// Looks up the posting list for `value` in this component, if the cell
    /// exists (disabled cells return `Some` with an empty list, per spec §3's
    /// "empty list != absent cell").
    fn get(&self, value: u64) -> Option<&PostingList>;

    /// Inserts `id` under `value`, applying the admission rule from spec §3.
    fn insert(&mut self, value: u64, id: u32);

    /// Number of distinct (non-absent) cells in this component.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cell whose posting list has `<= threshold` entries.
    fn prune(&mut self, threshold: usize);

    /// Summary statistics for this component, used by
    /// `InverseIndex::remove_hash_functions_below`'s μ+σ rule and by the
    /// distribution reporter.
    fn stats(&self) -> ComponentStats;

    /// Raw posting-list sizes for every live cell in this component, used by
    /// the distribution reporter to build an exact size histogram (as
    /// opposed to `stats()`'s aggregate mean/stddev).
    fn cell_sizes(&self) -> Vec<usize>;
}
