//! Row-partitioned multiplication on tokio's blocking thread pool.

use std::ops::Range;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::matrix::multiply_rows;
use crate::partition::row_partitions;
use crate::{Error, SquareMatrix};

/// Computes `a × b` by submitting one task per row block to the runtime's
/// blocking pool.
///
/// Unlike [`SquareMatrix::multiply_concurrent`], no threads are created per
/// call: the pool's threads are reused across calls. Each task fills its own
/// row block with the same kernel as [`SquareMatrix::multiply`], and the
/// blocks are copied into the result only after every task has been awaited.
///
/// # Errors
///
/// Same as [`SquareMatrix::multiply_concurrent`]. A panicking or cancelled
/// task yields [`Error::WorkerFailure`]; no partial result is returned.
///
/// # Example
///
/// ```
/// use std::ops::Range;
/// use std::sync::Arc;
/// use square_matrix::{multiply_on_runtime, SquareMatrix};
///
/// #[tokio::main]
/// async fn main() -> Result<(), square_matrix::Error> {
///     let a = Arc::new(SquareMatrix::identity(3));
///     let b = Arc::new(SquareMatrix::from_row_major(3, (0..9).map(f64::from).collect())?);
///
///     let c = multiply_on_runtime(a, Arc::clone(&b), 2).await?;
///     assert_eq!(&c, b.as_ref());
///     Ok(())
/// }
/// ```
pub async fn multiply_on_runtime(
    a: Arc<SquareMatrix>,
    b: Arc<SquareMatrix>,
    parts: usize,
) -> Result<SquareMatrix, Error> {
    a.check_dim(&b)?;
    let n = a.dim();
    let ranges = row_partitions(n, parts)?;

    let handles: Vec<_> = ranges
        .non_empty()
        .map(|(worker, rows)| {
            let a = Arc::clone(&a);
            let b = Arc::clone(&b);
            let task_rows = rows.clone();
            debug!(worker, start = rows.start, end = rows.end, "submitting row block");
            let handle = tokio::task::spawn_blocking(move || {
                let mut block = vec![0.0; task_rows.len() * n];
                multiply_rows(a.as_slice(), b.as_slice(), n, task_rows, &mut block);
                block
            });
            (worker, rows, handle)
        })
        .collect();

    let data = assemble_blocks(n, handles).await?;
    SquareMatrix::from_row_major(n, data)
}

/// Awaits every row block task and copies the blocks into one row-major
/// buffer of `n * n` values.
///
/// Every task is awaited even after a failure; the first failure is
/// returned.
async fn assemble_blocks(
    n: usize,
    handles: Vec<(usize, Range<usize>, JoinHandle<Vec<f64>>)>,
) -> Result<Vec<f64>, Error> {
    let mut data = vec![0.0; n * n];
    let mut failure = None;
    for (worker, rows, handle) in handles {
        match handle.await {
            Ok(block) => data[rows.start * n..rows.end * n].copy_from_slice(&block),
            Err(e) => {
                warn!(worker, error = %e, "row block task failed");
                if failure.is_none() {
                    failure = Some(Error::WorkerFailure(format!("worker {}: {}", worker, e)));
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(data),
    }
}
