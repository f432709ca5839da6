//! Approximate nearest-neighbor retrieval over sparse feature vectors,
//! built on MinHash locality-sensitive signatures and an inverted index
//! whose per-component posting-list storage is either a plain hash map or a
//! compact Bloomier filter.
//!
//! [`MinHashIndex`] is the facade: `fit` ingests a [`SparseMatrix`] of
//! training instances, `kneighbors` answers approximate k-NN queries, and
//! `radius_neighbors` answers fixed-collision-count queries. Everything
//! underneath — signature computation, the inverted index, candidate
//! refinement — is reachable directly for callers who want finer control.

pub mod bloomier;
pub mod config;
pub mod distribution;
pub mod error;
pub mod hash;
pub mod inverse_index;
pub mod posting_list;
pub mod refinement;
pub mod signature;
pub mod sparse_matrix;
pub mod storage;

pub use config::{Configuration, HashAlgorithm};
pub use error::{MinHashError, Result};
pub use inverse_index::{InverseIndex, Neighborhood};
pub use sparse_matrix::{FeatureVector, SparseMatrix};

/// Top-level facade tying signature computation, the inverted index, and
/// optional exact refinement together — the Rust-native analogue of
/// `minHash.cpp`'s public interface, minus the Python marshalling layer
/// that belongs to language bindings rather than this crate.
pub struct MinHashIndex {
    index: InverseIndex,
    corpus: Option<SparseMatrix>,
}

impl MinHashIndex {
    pub fn new(config: Configuration) -> Self {
        Self {
            index: InverseIndex::new(config),
            corpus: None,
        }
    }

    pub fn config(&self) -> &Configuration {
        self.index.config()
    }

    pub fn is_fitted(&self) -> bool {
        self.index.is_fitted()
    }

    /// Ingests the training corpus and builds the inverted index. The
    /// corpus is retained (cheaply, as it's already owned) so that
    /// `fast == false` queries can refine candidates against the original
    /// features.
    pub fn fit(&mut self, corpus: SparseMatrix) -> Result<()> {
        self.index.fit(&corpus)?;
        self.corpus = Some(corpus);
        Ok(())
    }

    /// Approximate k-nearest-neighbor query. When `Configuration::fast` is
    /// `false`, the over-selected `k * excess_factor` candidate pool the
    /// inverted index returns is re-ranked against the exact sparse
    /// features and truncated to the final `k`; when `true`, the
    /// collision-count ranking from the inverted index is used directly.
    pub fn kneighbors(&self, query: &SparseMatrix) -> Result<Neighborhood> {
        let k = self.index.config().n_neighbors;
        let approx = self.index.kneighbors(query, k)?;

        if self.index.config().fast {
            let mut neighbors = approx.neighbors;
            let mut distances = approx.distances;
            for i in 0..neighbors.len() {
                neighbors[i].truncate(k);
                distances[i].truncate(k);
            }
            return Ok(Neighborhood {
                neighbors,
                distances,
            });
        }

        let corpus = self.corpus.as_ref().ok_or(MinHashError::NotFitted)?;
        let similarity = self.index.config().similarity;
        let mut neighbors = Vec::with_capacity(approx.neighbors.len());
        let mut distances = Vec::with_capacity(approx.neighbors.len());
        for (i, candidates) in approx.neighbors.iter().enumerate() {
            let query_vector = query.instance(i);
            let (ids, dists) =
                refinement::refine(corpus, &query_vector, candidates, k, similarity);
            neighbors.push(ids);
            distances.push(dists);
        }
        Ok(Neighborhood {
            neighbors,
            distances,
        })
    }

    /// Returns only the candidates whose approximate collision count meets
    /// or exceeds `min_collisions`, without the `k`-truncation `kneighbors`
    /// applies. Useful when the caller cares about "all sufficiently
    /// similar instances" rather than a fixed-size top-k.
    pub fn radius_neighbors(&self, query: &SparseMatrix, min_collisions: usize) -> Result<Neighborhood> {
        let excess_k = self.index.config().n_neighbors.max(1);
        let mut result = self.index.kneighbors(query, excess_k)?;
        let max_collisions = self.index.config().maximal_number_of_hash_collisions as f32;
        let threshold = 1.0 - (min_collisions as f32 / max_collisions);
        for i in 0..result.neighbors.len() {
            let keep: Vec<usize> = result.distances[i]
                .iter()
                .enumerate()
                .filter(|&(_, &d)| d <= threshold)
                .map(|(idx, _)| idx)
                .collect();
            result.neighbors[i] = keep.iter().map(|&idx| result.neighbors[i][idx]).collect();
            result.distances[i] = keep.iter().map(|&idx| result.distances[i][idx]).collect();
        }
        Ok(result)
    }

    pub fn prune(&self, threshold: usize) -> Result<()> {
        self.index.prune(threshold)
    }

    pub fn remove_hash_functions_below(&self, threshold: usize) -> Result<()> {
        self.index.remove_hash_functions_below(threshold)
    }

    pub fn distribution(&self) -> distribution::Distribution {
        self.index.distribution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> SparseMatrix {
        SparseMatrix::from_triples(
            vec![
                (0, 50, 1.0),
                (0, 60, 1.0),
                (0, 70, 1.0),
                (1, 200, 1.0),
                (1, 210, 1.0),
                (1, 220, 1.0),
                (2, 1, 1.0),
                (2, 2, 1.0),
                (2, 4, 1.0),
            ],
            3,
        )
    }

    fn config() -> Configuration {
        Configuration::new()
            .number_of_hash_functions(40)
            .block_size(2)
            .max_bin_size(100)
            .n_neighbors(2)
            .excess_factor(3)
            .maximal_number_of_hash_collisions(21)
    }

    #[test]
    fn fast_query_finds_closest_neighbor_of_near_duplicate() {
        let mut index = MinHashIndex::new(config());
        index.fit(corpus()).unwrap();

        let query = SparseMatrix::from_triples(vec![(0, 1, 1.0), (0, 2, 1.0), (0, 99, 1.0)], 1);
        let result = index.kneighbors(&query).unwrap();
        assert_eq!(result.neighbors[0].first(), Some(&2));
    }

    #[test]
    fn refined_query_respects_n_neighbors_cap() {
        let mut index = MinHashIndex::new(config().fast(false));
        index.fit(corpus()).unwrap();
        let query = SparseMatrix::from_triples(vec![(0, 1, 1.0), (0, 2, 1.0)], 1);
        let result = index.kneighbors(&query).unwrap();
        assert!(result.neighbors[0].len() <= 2);
    }

    #[test]
    fn query_before_fit_errors() {
        let index = MinHashIndex::new(config());
        let query = SparseMatrix::from_triples(vec![(0, 1, 1.0)], 1);
        assert!(matches!(index.kneighbors(&query), Err(MinHashError::NotFitted)));
    }
}
