//! Error types for remap_bench.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Batch width does not match the operator's input width. This is a
    /// contract violation by the caller, checked on every apply call.
    #[error("shape mismatch: operator expects batch width {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// The triplet arrays do not describe a valid operator. Raised once at
    /// construction or load time; indices are trusted afterwards.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    /// Loader failures; npy parse errors surface through `std::io::Error`.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
