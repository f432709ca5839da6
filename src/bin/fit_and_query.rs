//! Fits a `MinHashIndex` over a flat triples file and runs a handful of
//! example queries against it, reporting timing and an index-wide
//! distribution summary. Grounded in the shape of `seismic`'s example CLI
//! binaries: `clap` for argument parsing, `log`/`env_logger` for
//! diagnostics, `std::time::Instant` for timing.

use clap::Parser;
use minhash_nn::{Configuration, MinHashIndex, SparseMatrix};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Fits a MinHash nearest-neighbor index over a sparse training corpus and
/// queries it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a whitespace-separated `instance feature value` triples file
    /// used as the training corpus.
    #[arg(long)]
    corpus: PathBuf,

    /// Path to a triples file of query instances; defaults to re-querying
    /// the training corpus itself when omitted.
    #[arg(long)]
    queries: Option<PathBuf>,

    #[arg(long, default_value_t = 400)]
    number_of_hash_functions: usize,

    #[arg(long, default_value_t = 5)]
    block_size: usize,

    #[arg(long, default_value_t = 5)]
    n_neighbors: usize,

    #[arg(long, default_value_t = 50)]
    max_bin_size: usize,

    #[arg(long)]
    bloomier_filter: bool,

    #[arg(long)]
    exact: bool,
}

fn load_triples(path: &PathBuf) -> (Vec<(u32, u32, f32)>, usize) {
    let content = fs::read_to_string(path).expect("failed to read triples file");
    let mut triples = Vec::new();
    let mut max_instance = 0usize;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let instance: u32 = parts.next().unwrap().parse().expect("bad instance id");
        let feature: u32 = parts.next().unwrap().parse().expect("bad feature id");
        let value: f32 = parts
            .next()
            .map(|v| v.parse().expect("bad value"))
            .unwrap_or(1.0);
        max_instance = max_instance.max(instance as usize + 1);
        triples.push((instance, feature, value));
    }
    (triples, max_instance)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = Configuration::new()
        .number_of_hash_functions(args.number_of_hash_functions)
        .block_size(args.block_size)
        .n_neighbors(args.n_neighbors)
        .max_bin_size(args.max_bin_size)
        .bloomier_filter(args.bloomier_filter)
        .fast(!args.exact);

    let (corpus_triples, corpus_size) = load_triples(&args.corpus);
    log::info!(
        "loaded {} triples across {} instances",
        corpus_triples.len(),
        corpus_size
    );
    let corpus = SparseMatrix::from_triples(corpus_triples, corpus_size);

    let mut index = MinHashIndex::new(config);
    let fit_start = Instant::now();
    index.fit(corpus).expect("fit failed");
    log::info!("fit completed in {:?}", fit_start.elapsed());

    let query_matrix = match &args.queries {
        Some(path) => {
            let (triples, size) = load_triples(path);
            SparseMatrix::from_triples(triples, size)
        }
        None => {
            log::info!("no --queries given; re-querying the training corpus");
            let (triples, _) = load_triples(&args.corpus);
            let size = triples.iter().map(|(id, _, _)| *id as usize + 1).max().unwrap_or(0);
            SparseMatrix::from_triples(triples, size)
        }
    };

    let query_start = Instant::now();
    let result = index.kneighbors(&query_matrix).expect("query failed");
    let elapsed = query_start.elapsed();
    log::info!(
        "queried {} instances in {:?} ({:?}/query)",
        query_matrix.num_instances(),
        elapsed,
        elapsed / query_matrix.num_instances().max(1) as u32
    );

    for (id, (neighbors, distances)) in result
        .neighbors
        .iter()
        .zip(result.distances.iter())
        .enumerate()
        .take(10)
    {
        println!("{id}: {neighbors:?} (distances {distances:?})");
    }

    let distribution = index.distribution();
    println!(
        "components: {} mean cells/component: {:.2} stddev: {:.2}",
        distribution.per_component.len(),
        distribution.mean_cells_per_component,
        distribution.stddev_cells_per_component
    );
}
