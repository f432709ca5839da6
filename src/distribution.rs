//! Distribution reporter: summary statistics over the index (means,
//! variances, histograms), grounded in
//! `InverseIndexStorageUnorderedMap::getDistribution`.

use std::collections::BTreeMap;

/// Per-component summary: how many cells it holds and the mean/stddev of
/// posting-list sizes across those cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentStats {
    pub num_cells: usize,
    pub mean_posting_list_size: f64,
    pub stddev_posting_list_size: f64,
}

impl ComponentStats {
    pub fn from_sizes(sizes: &[usize]) -> Self {
        let num_cells = sizes.len();
        if num_cells == 0 {
            return Self::default();
        }
        let mean = sizes.iter().sum::<usize>() as f64 / num_cells as f64;
        let variance = sizes
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / num_cells as f64;
        Self {
            num_cells,
            mean_posting_list_size: mean,
            stddev_posting_list_size: variance.sqrt(),
        }
    }
}

/// Index-wide distribution, aggregating every component's `ComponentStats`
/// plus a histogram of posting-list sizes across the whole index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    pub per_component: Vec<ComponentStats>,
    /// `posting_list_size -> count of cells with that size`, across all
    /// components.
    pub histogram: BTreeMap<usize, usize>,
    pub mean_cells_per_component: f64,
    pub stddev_cells_per_component: f64,
}

impl Distribution {
    pub fn build(per_component: Vec<ComponentStats>, histogram: BTreeMap<usize, usize>) -> Self {
        let counts: Vec<f64> = per_component.iter().map(|c| c.num_cells as f64).collect();
        let (mean, stddev) = mean_stddev(&counts);
        Self {
            per_component,
            histogram,
            mean_cells_per_component: mean,
            stddev_cells_per_component: stddev,
        }
    }
}

pub(crate) fn mean_stddev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}
