//! The Bloomier-filter posting store: a compact, XOR-resolved representation
//! of `hashValue -> PostingList`, built by singleton discovery
//! (`order_and_match`) and bit-vector encoding (`encoder`). This is the most
//! algorithmically delicate part of the crate (spec §1).

pub mod encoder;
pub mod filter;
pub mod hash;
pub mod order_and_match;

pub use encoder::Encoder;
pub use filter::BloomierFilter;
pub use hash::BloomierHash;
pub use order_and_match::{OrderAndMatchFinder, SeedState};
