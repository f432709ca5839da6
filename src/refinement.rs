//! Exact candidate refinement over the raw sparse features, used to recover
//! the true top-`k` from the over-selected `k * excess_factor` candidate
//! pool the inverted index hands back. Grounded in the `sortResultsBySimilarity`
//! pass of `minHash.cpp`, which follows the approximate lookup with an exact
//! re-ranking step whenever `fast == false`.

use crate::sparse_matrix::{FeatureVector, SparseMatrix};

/// Squared Euclidean distance between two sparse feature vectors, computed
/// only over the union of their nonzero features.
fn squared_euclidean(query: &FeatureVector, candidate: &FeatureVector) -> f32 {
    let mut qi = 0;
    let mut ci = 0;
    let mut sum = 0.0f32;
    while qi < query.features.len() && ci < candidate.features.len() {
        let qf = query.features[qi];
        let cf = candidate.features[ci];
        match qf.cmp(&cf) {
            std::cmp::Ordering::Less => {
                sum += query.values[qi] * query.values[qi];
                qi += 1;
            }
            std::cmp::Ordering::Greater => {
                sum += candidate.values[ci] * candidate.values[ci];
                ci += 1;
            }
            std::cmp::Ordering::Equal => {
                let d = query.values[qi] - candidate.values[ci];
                sum += d * d;
                qi += 1;
                ci += 1;
            }
        }
    }
    for i in qi..query.features.len() {
        sum += query.values[i] * query.values[i];
    }
    for i in ci..candidate.features.len() {
        sum += candidate.values[i] * candidate.values[i];
    }
    sum
}

/// Cosine similarity converted to a distance (`1 - cos`), for corpora where
/// `Configuration::similarity` is set.
fn cosine_distance(query: &FeatureVector, candidate: &FeatureVector) -> f32 {
    let mut qi = 0;
    let mut ci = 0;
    let mut dot = 0.0f32;
    while qi < query.features.len() && ci < candidate.features.len() {
        let qf = query.features[qi];
        let cf = candidate.features[ci];
        match qf.cmp(&cf) {
            std::cmp::Ordering::Less => qi += 1,
            std::cmp::Ordering::Greater => ci += 1,
            std::cmp::Ordering::Equal => {
                dot += query.values[qi] * candidate.values[ci];
                qi += 1;
                ci += 1;
            }
        }
    }
    let qnorm: f32 = query.values.iter().map(|v| v * v).sum::<f32>().sqrt();
    let cnorm: f32 = candidate.values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if qnorm == 0.0 || cnorm == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (qnorm * cnorm))
}

/// Re-ranks `candidates` (instance ids from the approximate lookup) against
/// `query` by exact distance and truncates to the final `k`. The candidate
/// set is already deduplicated and roughly similarity-ordered by the
/// inverted index; this pass just replaces the approximate collision-count
/// distance with an exact one before the final cut.
pub fn refine(
    matrix: &SparseMatrix,
    query: &FeatureVector,
    candidates: &[u32],
    k: usize,
    similarity: bool,
) -> (Vec<u32>, Vec<f32>) {
    let mut scored: Vec<(u32, f32)> = candidates
        .iter()
        .map(|&id| {
            let candidate = matrix.instance(id as usize);
            let distance = if similarity {
                cosine_distance(query, &candidate)
            } else {
                squared_euclidean(query, &candidate)
            };
            (id, distance)
        })
        .collect();

    let take = k.min(scored.len());
    if take < scored.len() {
        scored.select_nth_unstable_by(take.saturating_sub(1), |a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    scored.truncate(take);
    scored.sort_unstable_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let ids = scored.iter().map(|&(id, _)| id).collect();
    let distances = scored.iter().map(|&(_, d)| d).collect();
    (ids, distances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_exact_closest_by_euclidean_distance() {
        let matrix = SparseMatrix::from_triples(
            vec![
                (0, 1, 1.0),
                (0, 2, 1.0),
                (1, 1, 5.0),
                (1, 2, 5.0),
                (2, 1, 1.1),
                (2, 2, 0.9),
            ],
            3,
        );
        let query = FeatureVector {
            features: vec![1, 2],
            values: vec![1.0, 1.0],
        };
        let (ids, distances) = refine(&matrix, &query, &[0, 1, 2], 1, false);
        assert_eq!(ids, vec![0]);
        assert!(distances[0] < 0.1);
    }

    #[test]
    fn truncates_to_k() {
        let matrix = SparseMatrix::from_triples(
            vec![(0, 1, 1.0), (1, 1, 2.0), (2, 1, 3.0)],
            3,
        );
        let query = FeatureVector {
            features: vec![1],
            values: vec![1.0],
        };
        let (ids, _distances) = refine(&matrix, &query, &[0, 1, 2], 2, false);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], 0);
    }

    #[test]
    fn disjoint_features_use_full_norm() {
        let matrix = SparseMatrix::from_triples(vec![(0, 5, 2.0)], 1);
        let query = FeatureVector {
            features: vec![1],
            values: vec![3.0],
        };
        let (_ids, distances) = refine(&matrix, &query, &[0], 1, false);
        assert!((distances[0] - 13.0).abs() < 1e-4);
    }
}
