//! Seeded train/test partition of row indices.

use crate::error::ComputationError;
use crate::rng::{stream_rng, SPLIT_STREAM};
use rand::seq::SliceRandom;

/// Row indices for each side of a split, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..rows` with `seed` and hold out `ceil(rows * test_fraction)`.
///
/// The same `(rows, test_fraction, seed)` always yields the same partition.
/// Both sides must end up non-empty.
pub fn train_test_split(
    rows: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, ComputationError> {
    let test_len = (rows as f64 * test_fraction).ceil() as usize;
    if rows < 2 || test_len == 0 || test_len >= rows {
        return Err(ComputationError::InsufficientRows { rows });
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = stream_rng(seed, SPLIT_STREAM);
    indices.shuffle(&mut rng);

    let mut test = indices[..test_len].to_vec();
    let mut train = indices[test_len..].to_vec();
    test.sort_unstable();
    train.sort_unstable();
    Ok(TrainTestSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_fraction() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);

        // ceil(7 * 0.2) = 2
        let split = train_test_split(7, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn partition_is_disjoint_and_complete() {
        let split = train_test_split(25, 0.2, 3).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn deterministic_per_seed() {
        let a = train_test_split(50, 0.2, 42).unwrap();
        let b = train_test_split(50, 0.2, 42).unwrap();
        assert_eq!(a, b);
        let c = train_test_split(50, 0.2, 43).unwrap();
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn too_few_rows() {
        assert_eq!(
            train_test_split(1, 0.2, 42),
            Err(ComputationError::InsufficientRows { rows: 1 })
        );
        assert!(train_test_split(0, 0.2, 42).is_err());
        // Two rows at 0.2 leaves one on each side.
        assert!(train_test_split(2, 0.2, 42).is_ok());
    }
}
