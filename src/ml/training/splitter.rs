use crate::error::{PhishstackError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of one train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn class_indices(labels: &[u8]) -> [Vec<usize>; 2] {
    let mut by_class = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        by_class[usize::from(label.min(1))].push(i);
    }
    by_class
}

/// Shuffled split that keeps the class proportions of `labels` in both parts.
///
/// The test set holds `ceil(test_size * n)` rows, allotted to each class in
/// proportion to its size with the remainder going to the classes with the
/// largest fractional share.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PhishstackError::Training(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n = labels.len();
    let by_class = class_indices(labels);
    for (class, rows) in by_class.iter().enumerate() {
        if rows.len() < 2 {
            return Err(PhishstackError::Training(format!(
                "class {} has {} rows; at least 2 are needed for a stratified split",
                class,
                rows.len()
            )));
        }
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PhishstackError::Training(format!(
            "invalid split: {} of {} rows in the test set",
            n_test, n
        )));
    }

    // Proportional allocation, largest remainder first.
    let shares: Vec<f64> = by_class
        .iter()
        .map(|rows| n_test as f64 * rows.len() as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut leftover = n_test - alloc.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..by_class.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - shares[a].floor();
        let fb = shares[b] - shares[b].floor();
        fb.total_cmp(&fa)
    });
    for &class in &order {
        if leftover == 0 {
            break;
        }
        if alloc[class] < by_class[class].len() - 1 {
            alloc[class] += 1;
            leftover -= 1;
        }
    }
    for (class, rows) in by_class.iter().enumerate() {
        // Both partitions keep at least one row of every class.
        alloc[class] = alloc[class].clamp(1, rows.len() - 1);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (class, rows) in by_class.iter().enumerate() {
        let mut shuffled = rows.clone();
        shuffled.shuffle(&mut rng);
        let (test_part, train_part) = shuffled.split_at(alloc[class]);
        test.extend_from_slice(test_part);
        train.extend_from_slice(train_part);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    log::debug!(
        "stratified split: {} train / {} test rows (seed {})",
        train.len(),
        test.len(),
        seed
    );
    Ok(SplitIndices { train, test })
}

/// Unshuffled stratified k-fold: the i-th row of each class lands in fold
/// `i % k`, so every fold holds a near-equal share of both classes.
pub fn stratified_kfold(labels: &[u8], k: usize) -> Result<Vec<SplitIndices>> {
    if k < 2 {
        return Err(PhishstackError::Training(format!(
            "cross validation needs at least 2 folds, got {}",
            k
        )));
    }
    let by_class = class_indices(labels);
    for (class, rows) in by_class.iter().enumerate() {
        if rows.len() < k {
            return Err(PhishstackError::Training(format!(
                "class {} has {} rows, fewer than the {} folds requested",
                class,
                rows.len(),
                k
            )));
        }
    }

    let mut fold_of = vec![0usize; labels.len()];
    for rows in &by_class {
        for (pos, &row) in rows.iter().enumerate() {
            fold_of[row] = pos % k;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| fold_of[i] == fold);
            SplitIndices { train, test }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive_ratio(labels: &[u8], idx: &[usize]) -> f64 {
        idx.iter().filter(|&&i| labels[i] == 1).count() as f64 / idx.len() as f64
    }

    #[test]
    fn test_split_preserves_class_ratio() {
        let labels: Vec<u8> = (0..1000).map(|i| u8::from(i % 10 < 3)).collect();
        let split = stratified_split(&labels, 0.3, 42).unwrap();
        assert_eq!(split.test.len(), 300);
        assert_eq!(split.train.len(), 700);
        let diff = positive_ratio(&labels, &split.train) - positive_ratio(&labels, &split.test);
        assert!(diff.abs() < 0.02);
    }

    #[test]
    fn test_split_is_a_partition() {
        let labels: Vec<u8> = (0..57).map(|i| u8::from(i % 3 == 0)).collect();
        let split = stratified_split(&labels, 0.3, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..57).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let labels: Vec<u8> = (0..100).map(|i| (i % 2) as u8).collect();
        assert_eq!(
            stratified_split(&labels, 0.3, 42).unwrap(),
            stratified_split(&labels, 0.3, 42).unwrap()
        );
        assert_ne!(
            stratified_split(&labels, 0.3, 42).unwrap(),
            stratified_split(&labels, 0.3, 43).unwrap()
        );
    }

    #[test]
    fn test_split_rejects_tiny_class() {
        let labels = [0, 0, 0, 0, 1];
        assert!(stratified_split(&labels, 0.3, 42).is_err());
        assert!(stratified_split(&[0, 1, 0, 1], 1.0, 42).is_err());
    }

    #[test]
    fn test_kfold_round_robin() {
        let labels = [0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let folds = stratified_kfold(&labels, 5).unwrap();
        assert_eq!(folds.len(), 5);
        assert_eq!(folds[0].test, vec![0, 1]);
        assert_eq!(folds[4].test, vec![8, 9]);
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), labels.len());
        }
    }

    #[test]
    fn test_kfold_needs_rows_per_class() {
        let labels = [0, 0, 0, 0, 0, 1, 1];
        assert!(stratified_kfold(&labels, 5).is_err());
        assert!(stratified_kfold(&labels, 1).is_err());
    }
}
