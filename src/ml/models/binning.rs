//! Quantile binning of continuous features for histogram-based split search.

use crate::ml::matrix::FeatureMatrix;

/// Per-column split thresholds learned from training data.
///
/// A value `v` falls in bin `b` where `b` is the number of thresholds strictly
/// below `v`, so "bin <= b" is equivalent to "v <= thresholds[b]".
#[derive(Debug, Clone)]
pub struct FeatureBinner {
    thresholds: Vec<Vec<f64>>,
}

impl FeatureBinner {
    pub fn fit(x: &FeatureMatrix, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, u16::MAX as usize);
        let thresholds = (0..x.n_cols())
            .map(|col| column_thresholds(x.column(col), max_bins))
            .collect();
        Self { thresholds }
    }

    pub fn n_cols(&self) -> usize {
        self.thresholds.len()
    }

    pub fn n_bins(&self, col: usize) -> usize {
        self.thresholds[col].len() + 1
    }

    /// Raw-value threshold separating bins `..=bin` from `bin+1..`.
    pub fn threshold(&self, col: usize, bin: usize) -> f64 {
        self.thresholds[col][bin]
    }

    pub fn bin_of(&self, col: usize, value: f64) -> u16 {
        self.thresholds[col].partition_point(|&t| t < value) as u16
    }

    pub fn transform(&self, x: &FeatureMatrix) -> BinnedMatrix {
        let n_rows = x.n_rows();
        let mut bins = Vec::with_capacity(n_rows * x.n_cols());
        for col in 0..x.n_cols() {
            for row in 0..n_rows {
                bins.push(self.bin_of(col, x.get(row, col)));
            }
        }
        BinnedMatrix { n_rows, bins }
    }
}

/// Column-major bin indices for a training matrix.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    n_rows: usize,
    bins: Vec<u16>,
}

impl BinnedMatrix {
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn bin(&self, row: usize, col: usize) -> usize {
        self.bins[col * self.n_rows + row] as usize
    }
}

fn column_thresholds(mut values: Vec<f64>, max_bins: usize) -> Vec<f64> {
    values.retain(|v| v.is_finite());
    values.sort_by(|a, b| a.total_cmp(b));

    let mut distinct = values.clone();
    distinct.dedup();
    if distinct.len() <= 1 {
        return Vec::new();
    }

    if distinct.len() <= max_bins {
        return distinct.windows(2).map(|w| midpoint(w[0], w[1])).collect();
    }

    let n = values.len();
    let mut cuts = Vec::with_capacity(max_bins - 1);
    for k in 1..max_bins {
        let idx = k * n / max_bins;
        if idx == 0 || idx >= n {
            continue;
        }
        let (lo, hi) = (values[idx - 1], values[idx]);
        if lo < hi {
            let cut = midpoint(lo, hi);
            if cuts.last().map_or(true, |&last| cut > last) {
                cuts.push(cut);
            }
        }
    }
    cuts
}

fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) / 2.0
}
