//! Column-compressed storage of `(instance, feature, value)` triples with
//! per-instance iteration, grounded in `sparseMatrix.h` from the original
//! source and in the row/offset layout `seismic::SparseDataset` uses for its
//! own forward index.

use rayon::prelude::*;

/// One instance's sparse feature vector: feature ids (ascending, deduplicated)
/// with parallel weights. Weight `1.0` is used when the corpus carries no
/// explicit weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    pub features: Vec<u32>,
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Row-compressed `(instance, feature, value)` storage. Built once per
/// fit/query call and released when the caller drops it, per spec §3's
/// lifecycle note.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    offsets: Vec<usize>,
    features: Vec<u32>,
    values: Vec<f32>,
}

impl SparseMatrix {
    /// Builds a matrix from flattened, row-major triples. `max_instances`
    /// pre-sizes the offset table; instances never referenced stay empty.
    pub fn from_triples<I>(triples: I, max_instances: usize) -> Self
    where
        I: IntoIterator<Item = (u32, u32, f32)>,
    {
        let mut rows: Vec<Vec<(u32, f32)>> = vec![Vec::new(); max_instances];
        let mut overflow: Vec<(u32, Vec<(u32, f32)>)> = Vec::new();

        for (instance_id, feature_id, value) in triples {
            let idx = instance_id as usize;
            if idx < max_instances {
                rows[idx].push((feature_id, value));
            } else {
                match overflow.iter_mut().find(|(id, _)| *id == instance_id) {
                    Some((_, v)) => v.push((feature_id, value)),
                    None => overflow.push((instance_id, vec![(feature_id, value)])),
                }
            }
        }
        overflow.sort_unstable_by_key(|(id, _)| *id);
        for (_, v) in overflow {
            rows.push(v);
        }

        Self::from_rows(rows)
    }

    /// Builds a matrix directly from one row per instance, each row a list of
    /// `(feature_id, value)` pairs in arbitrary order; sorted ascending by
    /// feature id on ingestion per spec §3's ordering assumption.
    pub fn from_rows(mut rows: Vec<Vec<(u32, f32)>>) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut features = Vec::new();
        let mut values = Vec::new();
        offsets.push(0);

        for row in rows.iter_mut() {
            row.sort_unstable_by_key(|(f, _)| *f);
            row.dedup_by_key(|(f, _)| *f);
            for (f, v) in row.iter() {
                features.push(*f);
                values.push(*v);
            }
            offsets.push(features.len());
        }

        Self {
            offsets,
            features,
            values,
        }
    }

    pub fn num_instances(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.num_instances() == 0
    }

    /// Returns the feature ids and values for one instance, empty slices if
    /// the instance has no recorded features.
    pub fn instance(&self, instance_id: usize) -> FeatureVector {
        if instance_id + 1 >= self.offsets.len() {
            return FeatureVector::default();
        }
        let start = self.offsets[instance_id];
        let end = self.offsets[instance_id + 1];
        FeatureVector {
            features: self.features[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Borrowed view of one instance's feature ids, avoiding an allocation
    /// for hot paths (signature computation, refinement).
    pub fn instance_features(&self, instance_id: usize) -> &[u32] {
        if instance_id + 1 >= self.offsets.len() {
            return &[];
        }
        &self.features[self.offsets[instance_id]..self.offsets[instance_id + 1]]
    }

    pub fn instance_values(&self, instance_id: usize) -> &[f32] {
        if instance_id + 1 >= self.offsets.len() {
            return &[];
        }
        &self.values[self.offsets[instance_id]..self.offsets[instance_id + 1]]
    }

    /// Parallel iteration over every instance's `(id, features, values)`,
    /// used by `fit`/`kneighbors` to compute signatures across cores.
    pub fn par_instances(
        &self,
    ) -> impl IndexedParallelIterator<Item = (usize, &[u32], &[f32])> + '_ {
        (0..self.num_instances())
            .into_par_iter()
            .map(move |id| (id, self.instance_features(id), self.instance_values(id)))
    }
}
