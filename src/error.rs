//! Error types for square-matrix operations.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("matrix dimension mismatch: left is {0}x{0}, right is {1}x{1}")]
    DimensionMismatch(usize, usize),

    #[error("partition count must be at least 1")]
    InvalidPartitionCount,

    #[error("worker failed: {0}")]
    WorkerFailure(String),

    #[error("invalid value range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("dimension {0} is too large: {0}x{0} elements overflow usize")]
    DimensionOverflow(usize),

    #[error("expected {expected} elements, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
