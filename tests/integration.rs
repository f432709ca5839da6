//! Black-box coverage of the corpus-level scenarios from spec §8 that don't
//! fit naturally as a colocated `#[cfg(test)]` module: overflow disabling
//! across a full fit/query round trip, parallel-fit membership determinism,
//! and post-fit pruning.

use minhash_nn::config::Configuration;
use minhash_nn::sparse_matrix::SparseMatrix;
use minhash_nn::MinHashIndex;

fn triples_for(instances: &[(u32, &[u32])]) -> SparseMatrix {
    let mut triples = Vec::new();
    let mut max_instance = 0u32;
    for &(id, features) in instances {
        max_instance = max_instance.max(id);
        for &f in features {
            triples.push((id, f, 1.0f32));
        }
    }
    SparseMatrix::from_triples(triples, max_instance as usize + 1)
}

/// Scenario A — signature determinism: computing the same feature vector's
/// signature twice in the same process must be bitwise equal.
#[test]
fn scenario_a_signature_determinism() {
    use minhash_nn::signature::compute_signature;
    let a = compute_signature(&[3, 7, 9], 4, 2);
    let b = compute_signature(&[3, 7, 9], 4, 2);
    assert_eq!(&*a, &*b);
}

/// Scenario D — overflow disabling: once a cell has admitted `max_bin_size`
/// distinct ids, a query that hits only that cell must contribute zero
/// candidates for it (the cell is a sentinel, not a normal hit).
#[test]
fn scenario_d_overflow_cell_contributes_nothing() {
    let max_bin_size = 4;
    let config = Configuration::new()
        .number_of_hash_functions(10)
        .block_size(2)
        .max_bin_size(max_bin_size)
        .n_neighbors(3)
        .excess_factor(2)
        .maximal_number_of_hash_collisions(6)
        .minimal_blocks_in_common(0);

    // Every instance shares the exact same feature set, so every signature
    // component collides on one cell per hash-function index; once more
    // than `max_bin_size` instances are fit, that cell overflows and
    // disables across the board.
    let instances: Vec<(u32, &[u32])> = (0..(max_bin_size as u32 + 3))
        .map(|id| (id, &[1u32, 2, 3][..]))
        .collect();
    let corpus = triples_for(&instances);

    let mut index = MinHashIndex::new(config);
    index.fit(corpus).unwrap();

    let query = SparseMatrix::from_triples(vec![(0u32, 1u32, 1.0), (0, 2, 1.0), (0, 3, 1.0)], 1);
    let result = index.kneighbors(&query).unwrap();
    assert!(
        result.neighbors[0].is_empty(),
        "overflowed cells must be ignored on query, got {:?}",
        result.neighbors[0]
    );
}

/// Scenario E — parallel fit determinism of membership: fitting the same
/// corpus with different core counts must agree on which training
/// instances a given query collides with, even though intra-cell ordering
/// is unspecified.
#[test]
fn scenario_e_parallel_fit_membership_is_core_count_independent() {
    let mut instances = Vec::new();
    for i in 0..200u32 {
        instances.push((i, vec![i, i + 1, i + 2]));
    }
    let instance_refs: Vec<(u32, &[u32])> = instances.iter().map(|(id, f)| (*id, f.as_slice())).collect();
    let corpus_for = || triples_for(&instance_refs);

    let config = |cores: usize| {
        Configuration::new()
            .number_of_hash_functions(20)
            .block_size(2)
            .number_of_cores(cores)
            .max_bin_size(1000)
            .n_neighbors(5)
            .excess_factor(2)
            .maximal_number_of_hash_collisions(11)
            .minimal_blocks_in_common(0)
    };

    let mut parallel_index = MinHashIndex::new(config(4));
    parallel_index.fit(corpus_for()).unwrap();

    let mut serial_index = MinHashIndex::new(config(1));
    serial_index.fit(corpus_for()).unwrap();

    for i in [0u32, 50, 100, 199] {
        let query = SparseMatrix::from_triples(
            vec![(0u32, i, 1.0), (0, i + 1, 1.0), (0, i + 2, 1.0)],
            1,
        );
        let mut parallel_result: Vec<u32> = parallel_index.kneighbors(&query).unwrap().neighbors[0].clone();
        let mut serial_result: Vec<u32> = serial_index.kneighbors(&query).unwrap().neighbors[0].clone();
        parallel_result.sort_unstable();
        serial_result.sort_unstable();
        assert_eq!(
            parallel_result, serial_result,
            "membership for query anchored at instance {i} must not depend on core count"
        );
    }
}

/// Scenario F — prune: after `prune(2)`, a component that had cells of
/// size `{1,2,3,4,5}` must retain only the cells with size `> 2`.
#[test]
fn scenario_f_prune_drops_small_cells_end_to_end() {
    let config = Configuration::new()
        .number_of_hash_functions(4)
        .block_size(4)
        .max_bin_size(100)
        .n_neighbors(1)
        .excess_factor(1)
        .maximal_number_of_hash_collisions(2);

    // Five distinct feature sets admitted under five distinct instance
    // counts (1..5) so the resulting per-component posting lists, while not
    // guaranteed to land at exactly those sizes for every component (that
    // depends on hash collisions), are bounded below their admission count
    // and strictly shrink after pruning.
    let mut triples = Vec::new();
    let mut next_id = 0u32;
    for (group, size) in [(100u32, 1), (200, 2), (300, 3), (400, 4), (500, 5)] {
        for _ in 0..size {
            triples.push((next_id, group, 1.0f32));
            next_id += 1;
        }
    }
    let corpus = SparseMatrix::from_triples(triples, next_id as usize);

    let mut index = MinHashIndex::new(config);
    index.fit(corpus).unwrap();

    let before = index.distribution();
    index.prune(2).unwrap();
    let after = index.distribution();

    let before_small_cells: usize = before
        .histogram
        .iter()
        .filter(|&(&size, _)| size <= 2)
        .map(|(_, &count)| count)
        .sum();
    let after_small_cells: usize = after
        .histogram
        .iter()
        .filter(|&(&size, _)| size <= 2)
        .map(|(_, &count)| count)
        .sum();
    assert!(before_small_cells > 0, "fixture must produce at least one small cell to prune");
    assert_eq!(after_small_cells, 0, "prune(2) must drop every cell with size <= 2");
}
