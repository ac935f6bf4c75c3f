use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use square_matrix::{multiply_on_runtime, row_partitions, Error, SquareMatrix};

fn seeded_pair(n: usize, seed: u64) -> (SquareMatrix, SquareMatrix) {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = SquareMatrix::random_with(n, -10.0, 10.0, &mut rng).unwrap();
    let b = SquareMatrix::random_with(n, -10.0, 10.0, &mut rng).unwrap();
    (a, b)
}

#[test]
fn test_random_dimension_and_range() {
    for n in 1..12 {
        let m = SquareMatrix::random(n, 0.0, 10.0).unwrap();
        assert_eq!(m.len(), n * n);
        assert!(m.as_slice().iter().all(|&v| (0.0..=10.0).contains(&v)));
    }
}

#[test]
fn test_concurrent_matches_sequential() {
    for n in 1..=17 {
        let (a, b) = seeded_pair(n, n as u64);
        let expected = a.multiply(&b).unwrap();
        for parts in 1..=n {
            let actual = a.multiply_concurrent(&b, parts).unwrap();
            assert!(
                expected.approx_eq(&actual).unwrap(),
                "n = {}, parts = {}",
                n,
                parts
            );
        }
    }
}

#[test]
fn test_more_workers_than_rows() {
    let (a, b) = seeded_pair(6, 3);
    let expected = a.multiply(&b).unwrap();
    let actual = a.multiply_concurrent(&b, 6 + 5).unwrap();
    assert!(expected.approx_eq(&actual).unwrap());

    let actual = a.multiply_concurrent(&b, usize::MAX).unwrap();
    assert!(expected.approx_eq(&actual).unwrap());
}

#[test]
fn test_partitions_cover_rows_exactly_once() {
    for n in 1..50 {
        for parts in 1..=n {
            let mut hits = vec![0; n];
            for range in row_partitions(n, parts).unwrap() {
                for row in range {
                    hits[row] += 1;
                }
            }
            assert!(hits.iter().all(|&h| h == 1), "n = {}, parts = {}", n, parts);
        }
    }
}

#[test]
fn test_identity_is_neutral() {
    let (a, _) = seeded_pair(9, 11);
    let id = SquareMatrix::identity(9);

    assert!(a.multiply(&id).unwrap().approx_eq(&a).unwrap());
    assert!(id.multiply(&a).unwrap().approx_eq(&a).unwrap());
    assert!(a.multiply_concurrent(&id, 4).unwrap().approx_eq(&a).unwrap());
}

#[test]
fn test_zero_matrix_annihilates() {
    let (a, _) = seeded_pair(7, 5);
    let zero = SquareMatrix::zeros(7);

    assert_eq!(a.multiply(&zero).unwrap(), zero);
    assert_eq!(a.multiply_concurrent(&zero, 3).unwrap(), zero);
}

#[test]
fn test_known_small_case() {
    let a = SquareMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = SquareMatrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
    let expected = SquareMatrix::from_rows(vec![vec![19.0, 22.0], vec![43.0, 50.0]]).unwrap();

    assert_eq!(a.multiply(&b).unwrap(), expected);
    assert_eq!(a.multiply_concurrent(&b, 2).unwrap(), expected);
}

#[test]
fn test_mismatched_dimensions() {
    let a = SquareMatrix::zeros(2);
    let b = SquareMatrix::zeros(3);

    assert!(matches!(a.multiply(&b), Err(Error::DimensionMismatch(2, 3))));
    assert!(matches!(
        a.multiply_concurrent(&b, 1),
        Err(Error::DimensionMismatch(2, 3))
    ));
}

#[test]
fn test_zero_workers() {
    let (a, b) = seeded_pair(4, 1);
    assert!(matches!(
        a.multiply_concurrent(&b, 0),
        Err(Error::InvalidPartitionCount)
    ));
}

#[test]
fn test_clone_is_a_deep_copy() {
    // A copy used to keep only the dimension and come back zero-filled.
    let (a, _) = seeded_pair(4, 9);
    let copy = a.clone();
    assert_eq!(copy, a);
    assert_ne!(copy, SquareMatrix::zeros(4));
}

#[tokio::test]
async fn test_runtime_matches_sequential() {
    let (a, b) = seeded_pair(24, 21);
    let expected = a.multiply(&b).unwrap();

    let a = Arc::new(a);
    let b = Arc::new(b);
    for parts in [1, 2, 5, 24, 30] {
        let actual = multiply_on_runtime(Arc::clone(&a), Arc::clone(&b), parts)
            .await
            .unwrap();
        assert!(expected.approx_eq(&actual).unwrap(), "parts = {}", parts);
    }
}

#[tokio::test]
async fn test_runtime_rejects_bad_input() {
    let a = Arc::new(SquareMatrix::zeros(2));
    let b = Arc::new(SquareMatrix::zeros(3));

    let result = multiply_on_runtime(Arc::clone(&a), b, 2).await;
    assert!(matches!(result, Err(Error::DimensionMismatch(2, 3))));

    let result = multiply_on_runtime(Arc::clone(&a), a, 0).await;
    assert!(matches!(result, Err(Error::InvalidPartitionCount)));
}
