use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row partitions used for one training run
#[derive(Debug, Clone)]
pub struct Splits<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffles `0..n` with a seeded RNG and holds out `ceil(test_fraction * n)` indices.
/// Returns `(train, test)`.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((test_fraction * n as f64).ceil() as usize).min(n);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Test split first, then the leading `floor(val_fraction * train)` train rows become validation.
pub fn split_rows<T: Clone>(rows: &[T], test_fraction: f64, val_fraction: f64, seed: u64) -> Splits<T> {
    let (train_idx, test_idx) = train_test_split(rows.len(), test_fraction, seed);
    let mut train: Vec<T> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let test = test_idx.iter().map(|&i| rows[i].clone()).collect();

    let val_count = (val_fraction * train.len() as f64) as usize;
    let rest = train.split_off(val_count);
    Splits { train: rest, val: train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_fractions() {
        let rows: Vec<usize> = (0..101).collect();
        let s = split_rows(&rows, 0.2, 0.1, 42);
        // ceil(20.2) = 21 test, 80 remain, 8 of those validate
        assert_eq!(s.test.len(), 21);
        assert_eq!(s.val.len(), 8);
        assert_eq!(s.train.len(), 72);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let rows: Vec<usize> = (0..50).collect();
        let s = split_rows(&rows, 0.2, 0.1, 7);
        let mut all: Vec<usize> = s.train.iter().chain(&s.val).chain(&s.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, rows);
    }

    #[test]
    fn same_seed_same_split() {
        assert_eq!(train_test_split(30, 0.2, 42), train_test_split(30, 0.2, 42));
        assert_ne!(train_test_split(30, 0.2, 42).1, train_test_split(30, 0.2, 43).1);
    }

    #[test]
    fn tiny_dataset_has_no_validation() {
        let rows = vec!['a', 'b', 'c', 'd', 'e'];
        let s = split_rows(&rows, 0.2, 0.1, 42);
        assert_eq!(s.test.len(), 1);
        assert!(s.val.is_empty());
        assert_eq!(s.train.len(), 4);
    }
}
