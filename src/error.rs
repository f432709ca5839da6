//! Caller-facing error surface. Per spec §7, nearly everything in this crate
//! recovers locally (absent lookups, disabled cells, rejected batches); this
//! enum exists only for the handful of genuinely exceptional conditions a
//! caller must be told about rather than having silently no-op.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinHashError {
    #[error("fit() must be called before querying or pruning the index")]
    NotFitted,

    #[error("fit() called with an empty corpus")]
    EmptyCorpus,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, MinHashError>;
