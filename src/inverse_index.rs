//! `InverseIndex`: orchestrates signature computation, storage, and
//! k-nearest candidate generation. Grounded in `inverseIndex.cpp`.

use crate::config::Configuration;
use crate::distribution::{self, ComponentStats, Distribution};
use crate::error::{MinHashError, Result};
use crate::posting_list::PostingList;
use crate::signature::{self, Signature};
use crate::sparse_matrix::SparseMatrix;
use crate::storage::{BloomierStorage, HashMapStorage, InverseIndexStorage};

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `sid -> (instance ids sharing that sid, their shared signature)`, the
/// "SignatureStorage entry" of spec §3.
type SignatureStorage = HashMap<u64, (Vec<u32>, Signature)>;

struct IndexState {
    signature_storage: SignatureStorage,
    /// One slot per signature component; `None` means the component was
    /// dropped by `remove_hash_functions_below` and is treated as absent
    /// during scoring.
    components: Vec<Option<Box<dyn InverseIndexStorage>>>,
}

/// Two parallel ragged arrays of identical shape, the Rust-native analogue of
/// spec §6's output neighborhood format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighborhood {
    pub neighbors: Vec<Vec<u32>>,
    pub distances: Vec<Vec<f32>>,
}

pub struct InverseIndex {
    config: Configuration,
    state: Mutex<IndexState>,
    fitted: bool,
    instances_since_prune_check: AtomicUsize,
}

fn make_storage(config: &Configuration) -> Box<dyn InverseIndexStorage> {
    if config.bloomier_filter {
        Box::new(BloomierStorage::new(config.max_bin_size))
    } else {
        Box::new(HashMapStorage::new(
            config.max_bin_size,
            config.remove_value_with_least_significant_bit,
        ))
    }
}

impl InverseIndex {
    pub fn new(config: Configuration) -> Self {
        let b = config.signature_length();
        Self {
            state: Mutex::new(IndexState {
                signature_storage: HashMap::new(),
                components: (0..b).map(|_| Some(make_storage(&config))).collect(),
            }),
            config,
            fitted: false,
            instances_since_prune_check: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn chunk_size(&self, total: usize) -> usize {
        if self.config.chunk_size > 0 {
            self.config.chunk_size
        } else {
            total.div_ceil(self.config.number_of_cores.max(1)).max(1)
        }
    }

    fn build_pool(&self) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.number_of_cores.max(1))
            .build()
            .expect("failed to build rayon thread pool")
    }

    /// Ingests a training corpus and builds the index, per spec §4.3's
    /// `fit`. Worker-pool parallel over independent instances (spec §5); a
    /// single critical section per instance wraps the storage updates after
    /// the read-only signature math completes.
    pub fn fit(&mut self, matrix: &SparseMatrix) -> Result<()> {
        self.config.validate()?;
        if matrix.is_empty() {
            return Err(MinHashError::EmptyCorpus);
        }

        let h = self.config.number_of_hash_functions;
        let b = self.config.block_size;
        let total = matrix.num_instances();
        let chunk = self.chunk_size(total);
        let pool = self.build_pool();

        let progress = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::with_template("fitting {pos}/{len} instances ({elapsed})")
        {
            progress.set_style(style);
        }

        let prune_after = self.config.prune_inverse_index_after_instance;
        let prune_trigger = if prune_after > 0.0 && prune_after <= 1.0 {
            Some(((total as f32) * prune_after) as usize)
        } else {
            None
        };
        let prune_threshold = self.config.prune_inverse_index;
        let pruned_already = AtomicUsize::new(0);
        // Reborrow as shared: every use below only needs `&self.state`
        // (interior mutability via `Mutex`), and a shared reference is
        // `Sync`, unlike `&mut Self` itself.
        let this: &InverseIndex = self;

        pool.install(|| {
            matrix
                .par_instances()
                .with_min_len(chunk)
                .for_each(|(id, features, _values)| {
                    let signature = signature::compute_signature(features, h, b);
                    let sid = signature::signature_id(features);
                    let instance_id = id as u32;

                    {
                        let mut state = this.state.lock();
                        match state.signature_storage.get_mut(&sid) {
                            Some((ids, _existing_signature)) => ids.push(instance_id),
                            None => {
                                state
                                    .signature_storage
                                    .insert(sid, (vec![instance_id], signature.clone()));
                            }
                        }
                        for (j, &value) in signature.iter().enumerate() {
                            if value == 0 || value == u64::MAX {
                                continue;
                            }
                            if let Some(Some(component)) = state.components.get_mut(j) {
                                component.insert(value, instance_id);
                            }
                        }
                    }
                    progress.inc(1);

                    if let Some(trigger) = prune_trigger {
                        let done = this.instances_since_prune_check.fetch_add(1, Ordering::Relaxed) + 1;
                        if done >= trigger && pruned_already.swap(1, Ordering::Relaxed) == 0 {
                            let mut state = this.state.lock();
                            for component in state.components.iter_mut().flatten() {
                                component.prune(prune_threshold);
                            }
                        }
                    }
                });
        });

        progress.finish_and_clear();
        self.fitted = true;
        Ok(())
    }

    /// Returns, for each query instance, the approximate top
    /// `min(n_neighbors * excess_factor, candidates)` nearest training
    /// instances under the signature-collision distance proxy (spec §4.3's
    /// `kneighbors`). Candidates below `minimal_blocks_in_common` collisions
    /// are discarded before ranking.
    pub fn kneighbors(&self, query: &SparseMatrix, k: usize) -> Result<Neighborhood> {
        if !self.fitted {
            return Err(MinHashError::NotFitted);
        }
        let total = query.num_instances();
        let mut neighbors = vec![Vec::new(); total];
        let mut distances = vec![Vec::new(); total];
        if total == 0 {
            return Ok(Neighborhood {
                neighbors,
                distances,
            });
        }

        let h = self.config.number_of_hash_functions;
        let b = self.config.block_size;

        // Compute signatures in parallel, then group by sid to dedupe
        // equivalent queries for the duration of this call (spec §4.2/§4.3).
        let per_instance: Vec<(u32, u64, Signature)> = query
            .par_instances()
            .map(|(id, features, _values)| {
                let sig = signature::compute_signature(features, h, b);
                let sid = signature::signature_id(features);
                (id as u32, sid, sig)
            })
            .collect();

        let mut groups: HashMap<u64, (Vec<u32>, Signature)> = HashMap::new();
        for (id, sid, sig) in per_instance {
            groups
                .entry(sid)
                .and_modify(|(ids, _)| ids.push(id))
                .or_insert_with(|| (vec![id], sig));
        }

        let excess = self.config.excess_factor.max(1);
        let min_common = self.config.minimal_blocks_in_common;
        let max_collisions = self.config.maximal_number_of_hash_collisions.max(1) as f32;

        let results: Vec<(Vec<u32>, Vec<f32>, Vec<u32>)> = groups
            .into_par_iter()
            .map(|(_sid, (ids, signature))| {
                let counts = self.collect_candidate_counts(&signature);

                let candidates: Vec<(u32, usize)> = counts
                    .into_iter()
                    .filter(|&(_, count)| count >= min_common)
                    .sorted_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
                    .collect();

                let adjusted = (k.saturating_mul(excess)).min(candidates.len());
                let mut out_neighbors = Vec::with_capacity(adjusted);
                let mut out_distances = Vec::with_capacity(adjusted);
                for &(candidate_id, count) in candidates.iter().take(adjusted) {
                    out_neighbors.push(candidate_id);
                    out_distances.push(1.0 - (count as f32 / max_collisions));
                }
                (out_neighbors, out_distances, ids)
            })
            .collect();

        for (out_neighbors, out_distances, ids) in results {
            for id in ids {
                let idx = id as usize;
                if idx < total {
                    neighbors[idx] = out_neighbors.clone();
                    distances[idx] = out_distances.clone();
                }
            }
        }

        Ok(Neighborhood {
            neighbors,
            distances,
        })
    }

    /// For each non-degenerate signature component value, look up the
    /// component cell and, if present/enabled/under the bin-size cap,
    /// increment every id it lists. Sentinel values `0`/`MAX_VALUE` are
    /// discarded (spec §4.3).
    fn collect_candidate_counts(&self, signature: &Signature) -> HashMap<u32, usize> {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        let state = self.state.lock();
        for (j, &value) in signature.iter().enumerate() {
            if value == 0 || value == u64::MAX {
                continue;
            }
            let Some(Some(component)) = state.components.get(j) else {
                continue;
            };
            if let Some(list) = component.get(value) {
                if !list.is_disabled() && list.len() < self.config.max_bin_size {
                    for &id in list.ids() {
                        *counts.entry(id).or_insert(0) += 1;
                    }
                }
            }
        }
        counts
    }

    /// Drops cells whose posting list has `<= threshold` entries, across
    /// every active component (spec §4.3's `prune`).
    pub fn prune(&self, threshold: usize) -> Result<()> {
        if !self.fitted {
            return Err(MinHashError::NotFitted);
        }
        let mut state = self.state.lock();
        for component in state.components.iter_mut().flatten() {
            component.prune(threshold);
        }
        Ok(())
    }

    /// Drops under-populated components entirely (spec §4.3's
    /// `removeHashFunctionsBelow`): with `threshold == 0`, drop any
    /// component whose cell count is below `mean + stddev` over the
    /// pre-drop distribution; otherwise drop components below `threshold`
    /// cells outright. Dropped components are skipped during scoring.
    pub fn remove_hash_functions_below(&self, threshold: usize) -> Result<()> {
        if !self.fitted {
            return Err(MinHashError::NotFitted);
        }
        let mut state = self.state.lock();
        let sizes: Vec<f64> = state
            .components
            .iter()
            .map(|c| c.as_ref().map_or(0.0, |c| c.len() as f64))
            .collect();

        let cutoff = if threshold == 0 {
            let (mean, stddev) = distribution::mean_stddev(&sizes);
            mean + stddev
        } else {
            threshold as f64
        };

        for (component, &size) in state.components.iter_mut().zip(sizes.iter()) {
            if size < cutoff {
                *component = None;
            }
        }
        Ok(())
    }

    /// Summary statistics over the index: per-component mean/stddev of
    /// posting-list sizes plus a histogram, grounded in
    /// `InverseIndexStorageUnorderedMap::getDistribution`.
    pub fn distribution(&self) -> Distribution {
        let state = self.state.lock();
        let mut per_component = Vec::with_capacity(state.components.len());
        let mut histogram = std::collections::BTreeMap::new();
        for component in state.components.iter() {
            let stats: ComponentStats = component
                .as_ref()
                .map(|c| c.stats())
                .unwrap_or_default();
            per_component.push(stats);
        }
        for component in state.components.iter().flatten() {
            for size in component.cell_sizes() {
                *histogram.entry(size).or_insert(0) += 1;
            }
        }
        Distribution::build(per_component, histogram)
    }

    /// Self-collision count: looks up the candidate count for `instance_id`
    /// against its own signature, i.e. how many of the `B` components still
    /// index it (spec §8 invariant 1). Used by the self-retrieval tests.
    pub fn self_collision_count(&self, signature: &Signature, instance_id: u32) -> usize {
        self.collect_candidate_counts(signature)
            .get(&instance_id)
            .copied()
            .unwrap_or(0)
    }

    /// Posting list for a raw `(component, value)` cell, exposed for tests
    /// and the CLI's debug output.
    pub fn cell(&self, component: usize, value: u64) -> Option<PostingList> {
        let state = self.state.lock();
        state
            .components
            .get(component)
            .and_then(|c| c.as_ref())
            .and_then(|c| c.get(value))
            .cloned()
    }
}
