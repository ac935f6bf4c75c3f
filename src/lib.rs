//! Dense square matrix multiplication.
//!
//! `square-matrix` multiplies `N`×`N` matrices of `f64` in two ways: a
//! single-threaded triple loop, and a fork-join variant that splits the
//! output rows into contiguous blocks and computes each block on its own
//! thread. Both use the same per-cell summation order, so their results
//! agree exactly and can be checked against each other with
//! [`SquareMatrix::approx_eq`].
//!
//! # Row Partitioning
//!
//! With `p` workers and `N` rows, worker `i < p - 1` owns rows
//! `[i * N/p, (i + 1) * N/p)` and the last worker owns the rest up to `N`.
//! Blocks never overlap, which is the only thing keeping concurrent writes
//! into the shared result safe.
//!
//! # Example
//!
//! ```
//! use square_matrix::SquareMatrix;
//!
//! let a = SquareMatrix::random(64, 0.0, 10.0)?;
//! let b = SquareMatrix::random(64, 0.0, 10.0)?;
//!
//! let plain = a.multiply(&b)?;
//! let threaded = a.multiply_concurrent(&b, 4)?;
//! assert!(plain.approx_eq(&threaded)?);
//! # Ok::<(), square_matrix::Error>(())
//! ```

mod error;
mod matrix;
mod partition;
mod runtime;

pub use error::Error;
pub use matrix::SquareMatrix;
pub use partition::{row_partitions, RowPartitions};
pub use runtime::multiply_on_runtime;
