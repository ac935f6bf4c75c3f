//! Row-range partitioning for concurrent multiplication.

use std::iter::FusedIterator;
use std::ops::Range;

use crate::Error;

/// Splits `0..n` into `parts` contiguous, disjoint row ranges.
///
/// Every range except the last is `n / parts` rows wide; the last one runs to
/// `n` and absorbs the remainder. When `parts > n` the leading ranges are
/// empty and the last covers every row.
///
/// Ranges are produced lazily, so a huge `parts` costs nothing up front.
///
/// ```
/// use square_matrix::row_partitions;
///
/// let parts: Vec<_> = row_partitions(10, 3).unwrap().collect();
/// assert_eq!(parts, vec![0..3, 3..6, 6..10]);
/// ```
pub fn row_partitions(n: usize, parts: usize) -> Result<RowPartitions, Error> {
    if parts == 0 {
        return Err(Error::InvalidPartitionCount);
    }

    Ok(RowPartitions {
        n,
        parts,
        part_size: n / parts,
        next: 0,
    })
}

/// Iterator over the row ranges returned by [`row_partitions`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowPartitions {
    n: usize,
    parts: usize,
    part_size: usize,
    next: usize,
}

impl RowPartitions {
    fn range_of(&self, p: usize) -> Range<usize> {
        if p == self.parts - 1 {
            p * self.part_size..self.n
        } else {
            p * self.part_size..(p + 1) * self.part_size
        }
    }

    /// The remaining ranges that contain at least one row, paired with
    /// their worker index.
    ///
    /// When `parts > n` only the last worker has rows, and it is found
    /// without stepping over the empty ones.
    pub fn non_empty(self) -> impl Iterator<Item = (usize, Range<usize>)> {
        let first = if self.part_size == 0 {
            self.parts - 1
        } else {
            self.next
        };
        (first.max(self.next)..self.parts)
            .map(move |p| (p, self.range_of(p)))
            .filter(|(_, rows)| !rows.is_empty())
    }
}

impl Iterator for RowPartitions {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next == self.parts {
            return None;
        }
        let range = self.range_of(self.next);
        self.next += 1;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.parts - self.next;
        (len, Some(len))
    }
}

impl ExactSizeIterator for RowPartitions {}

impl FusedIterator for RowPartitions {}
