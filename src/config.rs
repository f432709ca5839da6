//! `Configuration`: every constructor parameter from spec §6, collected into
//! one builder struct in the style of `seismic::inverted_index::Configuration`'s
//! fluent `.pruning_strategy(...)` chain.

use crate::error::{MinHashError, Result};

/// Reserved for future hash-function families; spec §6 documents this option
/// but only one family ("simple", the mixing chain in `hash.rs`) is in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub number_of_hash_functions: usize,
    pub block_size: usize,
    pub number_of_cores: usize,
    pub chunk_size: usize,
    pub max_bin_size: usize,
    pub n_neighbors: usize,
    pub minimal_blocks_in_common: usize,
    pub excess_factor: usize,
    pub maximal_number_of_hash_collisions: usize,
    pub fast: bool,
    pub similarity: bool,
    pub bloomier_filter: bool,
    pub prune_inverse_index: usize,
    pub prune_inverse_index_after_instance: f32,
    pub remove_hash_function_with_less_entries_as: usize,
    pub hash_algorithm: HashAlgorithm,
    pub shingle: bool,
    pub shingle_size: usize,
    pub remove_value_with_least_significant_bit: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            number_of_hash_functions: 400,
            block_size: 5,
            number_of_cores: num_cpus(),
            chunk_size: 0,
            max_bin_size: 50,
            n_neighbors: 5,
            minimal_blocks_in_common: 1,
            excess_factor: 5,
            maximal_number_of_hash_collisions: 1,
            fast: true,
            similarity: false,
            bloomier_filter: false,
            prune_inverse_index: 0,
            prune_inverse_index_after_instance: -1.0,
            remove_hash_function_with_less_entries_as: 0,
            hash_algorithm: HashAlgorithm::Simple,
            shingle: false,
            shingle_size: 4,
            remove_value_with_least_significant_bit: 0,
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_hash_functions(mut self, v: usize) -> Self {
        self.number_of_hash_functions = v;
        self
    }

    pub fn block_size(mut self, v: usize) -> Self {
        self.block_size = v;
        self
    }

    pub fn number_of_cores(mut self, v: usize) -> Self {
        self.number_of_cores = v;
        self
    }

    pub fn chunk_size(mut self, v: usize) -> Self {
        self.chunk_size = v;
        self
    }

    pub fn max_bin_size(mut self, v: usize) -> Self {
        self.max_bin_size = v;
        self
    }

    pub fn n_neighbors(mut self, v: usize) -> Self {
        self.n_neighbors = v;
        self
    }

    pub fn minimal_blocks_in_common(mut self, v: usize) -> Self {
        self.minimal_blocks_in_common = v;
        self
    }

    pub fn excess_factor(mut self, v: usize) -> Self {
        self.excess_factor = v;
        self
    }

    pub fn maximal_number_of_hash_collisions(mut self, v: usize) -> Self {
        self.maximal_number_of_hash_collisions = v;
        self
    }

    pub fn fast(mut self, v: bool) -> Self {
        self.fast = v;
        self
    }

    pub fn similarity(mut self, v: bool) -> Self {
        self.similarity = v;
        self
    }

    pub fn bloomier_filter(mut self, v: bool) -> Self {
        self.bloomier_filter = v;
        self
    }

    pub fn prune_inverse_index(mut self, v: usize) -> Self {
        self.prune_inverse_index = v;
        self
    }

    pub fn prune_inverse_index_after_instance(mut self, v: f32) -> Self {
        self.prune_inverse_index_after_instance = v;
        self
    }

    pub fn remove_hash_function_with_less_entries_as(mut self, v: usize) -> Self {
        self.remove_hash_function_with_less_entries_as = v;
        self
    }

    pub fn hash_algorithm(mut self, v: HashAlgorithm) -> Self {
        self.hash_algorithm = v;
        self
    }

    pub fn shingle(mut self, v: bool, size: usize) -> Self {
        self.shingle = v;
        self.shingle_size = size;
        self
    }

    pub fn remove_value_with_least_significant_bit(mut self, v: u32) -> Self {
        self.remove_value_with_least_significant_bit = v;
        self
    }

    /// Signature length `B = ceil(H / b) + 1` implied by this configuration.
    pub fn signature_length(&self) -> usize {
        crate::signature::signature_length(self.number_of_hash_functions, self.block_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(MinHashError::InvalidConfiguration(
                "block_size must be nonzero".into(),
            ));
        }
        if self.number_of_hash_functions == 0 {
            return Err(MinHashError::InvalidConfiguration(
                "number_of_hash_functions must be nonzero".into(),
            ));
        }
        if self.max_bin_size == 0 {
            return Err(MinHashError::InvalidConfiguration(
                "max_bin_size must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains() {
        let cfg = Configuration::new()
            .number_of_hash_functions(40)
            .block_size(4)
            .max_bin_size(20);
        assert_eq!(cfg.number_of_hash_functions, 40);
        assert_eq!(cfg.block_size, 4);
        assert_eq!(cfg.max_bin_size, 20);
    }

    #[test]
    fn rejects_zero_block_size() {
        let cfg = Configuration::new().block_size(0);
        assert!(cfg.validate().is_err());
    }
}
