//! Dense square matrix with sequential and row-partitioned multiplication.

use std::any::Any;
use std::fmt;
use std::ops::{Index, IndexMut, Range};
use std::thread;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::partition::{row_partitions, RowPartitions};
use crate::Error;

/// An `N`×`N` matrix of `f64` values in row-major order.
///
/// Element `(i, j)` lives at linear index `i * N + j`. The dimension is
/// fixed at construction and the backing buffer always holds `N * N`
/// elements.
///
/// `Clone` is a deep copy: the clone owns its own buffer holding the same
/// values.
///
/// ```
/// use square_matrix::SquareMatrix;
///
/// let a = SquareMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// let b = SquareMatrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
///
/// let c = a.multiply(&b).unwrap();
/// assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
/// assert!(a.multiply_concurrent(&b, 2).unwrap().approx_eq(&c).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    /// Creates a zero-filled matrix of dimension `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n * n` overflows `usize`.
    pub fn zeros(n: usize) -> Self {
        let len = match element_count(n) {
            Ok(len) => len,
            Err(e) => panic!("{}", e),
        };
        Self {
            n,
            data: vec![0.0; len],
        }
    }

    /// Creates the identity matrix of dimension `n`.
    pub fn identity(n: usize) -> Self {
        let mut mat = Self::zeros(n);
        for i in 0..n {
            mat.data[i * n + i] = 1.0;
        }
        mat
    }

    /// Wraps a row-major buffer of exactly `n * n` values.
    pub fn from_row_major(n: usize, data: Vec<f64>) -> Result<Self, Error> {
        let len = element_count(n)?;
        if data.len() != len {
            return Err(Error::InvalidLength {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self { n, data })
    }

    /// Builds a matrix from a list of rows; every row must have one entry
    /// per row in the list.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let n = rows.len();
        let mut data = Vec::with_capacity(element_count(n)?);
        for row in rows {
            if row.len() != n {
                return Err(Error::InvalidLength {
                    expected: n,
                    actual: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self { n, data })
    }

    /// Fills a matrix with values drawn uniformly from `[min, max]`.
    ///
    /// Each call seeds its own generator from OS entropy, so successive
    /// calls are independent and not reproducible. Use
    /// [`random_with`](Self::random_with) for a caller-controlled source.
    pub fn random(n: usize, min: f64, max: f64) -> Result<Self, Error> {
        let mut rng = StdRng::from_entropy();
        Self::random_with(n, min, max, &mut rng)
    }

    /// Fills a matrix with values drawn uniformly from `[min, max]` using
    /// the given generator.
    pub fn random_with<R: Rng + ?Sized>(
        n: usize,
        min: f64,
        max: f64,
        rng: &mut R,
    ) -> Result<Self, Error> {
        if !min.is_finite() || !max.is_finite() || min > max || !(max - min).is_finite() {
            return Err(Error::InvalidRange { min, max });
        }

        let len = element_count(n)?;
        let dist = Uniform::new_inclusive(min, max);
        let data = (0..len).map(|_| dist.sample(rng)).collect();
        Ok(Self { n, data })
    }

    /// Row and column count.
    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Total number of elements, always `dim() * dim()`.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for the degenerate `0`×`0` matrix.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns element `(i, j)`, or `None` when either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.n && j < self.n {
            Some(self.data[i * self.n + j])
        } else {
            None
        }
    }

    /// The row-major backing buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Iterates over the rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n.max(1))
    }

    /// Computes `self × other` on the calling thread.
    ///
    /// Every cell is accumulated over `k = 0..N` in order, so the result is
    /// deterministic for fixed inputs.
    pub fn multiply(&self, other: &Self) -> Result<Self, Error> {
        self.check_dim(other)?;

        let n = self.n;
        let mut result = Self::zeros(n);
        multiply_rows(&self.data, &other.data, n, 0..n, &mut result.data);
        Ok(result)
    }

    /// Computes `self × other` with `parts` threads, each owning a
    /// contiguous block of output rows.
    ///
    /// Rows are split by [`row_partitions`](crate::row_partitions). Workers
    /// write into disjoint slices of the result, so no locking is involved,
    /// and they use the same per-cell summation as
    /// [`multiply`](Self::multiply). The call returns once every worker has
    /// been joined.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if the operands differ in size.
    /// - [`Error::InvalidPartitionCount`] if `parts` is zero.
    /// - [`Error::WorkerFailure`] if a worker thread could not be started or
    ///   panicked.
    pub fn multiply_concurrent(&self, other: &Self, parts: usize) -> Result<Self, Error> {
        self.check_dim(other)?;
        let ranges = row_partitions(self.n, parts)?;

        let n = self.n;
        let a = self.data.as_slice();
        let b = other.data.as_slice();
        let mut result = Self::zeros(n);

        fork_join(&mut result.data, n, ranges, |rows, block| {
            multiply_rows(a, b, n, rows, block)
        })?;

        Ok(result)
    }

    /// Returns `true` when every element pair differs by at most
    /// `f64::EPSILON`.
    ///
    /// Both multiplication paths sum each cell in the same order, so their
    /// results are expected to match exactly.
    pub fn approx_eq(&self, other: &Self) -> Result<bool, Error> {
        self.approx_eq_within(other, f64::EPSILON)
    }

    /// Returns `true` when every element pair differs by at most `tolerance`.
    pub fn approx_eq_within(&self, other: &Self, tolerance: f64) -> Result<bool, Error> {
        self.check_dim(other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .all(|(x, y)| (x - y).abs() <= tolerance))
    }

    pub(crate) fn check_dim(&self, other: &Self) -> Result<(), Error> {
        if self.n != other.n {
            return Err(Error::DimensionMismatch(self.n, other.n));
        }
        Ok(())
    }
}

/// `n * n`, or [`Error::DimensionOverflow`] when it does not fit in `usize`.
fn element_count(n: usize) -> Result<usize, Error> {
    n.checked_mul(n).ok_or(Error::DimensionOverflow(n))
}

/// Computes output rows `rows` of `a × b` into `out`, which holds exactly
/// those rows.
pub(crate) fn multiply_rows(
    a: &[f64],
    b: &[f64],
    n: usize,
    rows: Range<usize>,
    out: &mut [f64],
) {
    debug_assert_eq!(out.len(), rows.len() * n);

    for (local, i) in rows.enumerate() {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += a[i * n + k] * b[k * n + j];
            }
            out[local * n + j] = sum;
        }
    }
}

/// Spawns one scoped thread per non-empty row range, handing each its own
/// slice of `out`, and joins all of them.
///
/// Empty ranges get no thread. If a thread cannot be started, no further
/// workers are spawned. Returns the first failure after every started thread
/// has been joined.
fn fork_join<F>(out: &mut [f64], n: usize, ranges: RowPartitions, work: F) -> Result<(), Error>
where
    F: Fn(Range<usize>, &mut [f64]) + Sync,
{
    let mut rest = out;
    let mut blocks = Vec::new();
    for (worker, rows) in ranges.non_empty() {
        let (block, tail) = std::mem::take(&mut rest).split_at_mut(rows.len() * n);
        blocks.push((worker, rows, block));
        rest = tail;
    }

    let work = &work;
    thread::scope(|s| {
        let mut failure = None;
        let mut handles = Vec::with_capacity(blocks.len());
        for (worker, rows, block) in blocks {
            debug!(worker, start = rows.start, end = rows.end, "spawning row worker");
            let spawned = thread::Builder::new()
                .name(format!("row-worker-{}", worker))
                .spawn_scoped(s, move || work(rows, block));
            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(e) => {
                    warn!(worker, error = %e, "could not start row worker");
                    failure = Some(Error::WorkerFailure(format!("worker {}: {}", worker, e)));
                    break;
                }
            }
        }

        for (worker, handle) in handles {
            if let Err(payload) = handle.join() {
                let message = panic_message(&*payload);
                warn!(worker, %message, "row worker panicked");
                if failure.is_none() {
                    failure = Some(Error::WorkerFailure(format!(
                        "worker {}: {}",
                        worker, message
                    )));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Index<(usize, usize)> for SquareMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(
            i < self.n && j < self.n,
            "index ({}, {}) out of bounds for {}x{} matrix",
            i,
            j,
            self.n,
            self.n
        );
        &self.data[i * self.n + j]
    }
}

impl IndexMut<(usize, usize)> for SquareMatrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(
            i < self.n && j < self.n,
            "index ({}, {}) out of bounds for {}x{} matrix",
            i,
            j,
            self.n,
            self.n
        );
        &mut self.data[i * self.n + j]
    }
}

/// One row per line, values with one decimal place separated by spaces.
impl fmt::Display for SquareMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:.1}", value)?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
