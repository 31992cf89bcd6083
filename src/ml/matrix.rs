use crate::error::{PhishstackError, Result};
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of model inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            data: Vec::new(),
        }
    }

    pub fn from_rows<R: AsRef<[f64]>>(n_cols: usize, rows: &[R]) -> Result<Self> {
        let mut matrix = Self::new(n_cols);
        for row in rows {
            matrix.push_row(row.as_ref())?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.n_cols {
            return Err(PhishstackError::ShapeMismatch {
                expected: self.n_cols,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        if self.n_cols == 0 {
            0
        } else {
            self.data.len() / self.n_cols
        }
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_cols.max(1))
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        self.rows().map(|r| r[col]).collect()
    }

    /// New matrix holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            n_cols: self.n_cols,
            data,
        }
    }
}

/// Picks `labels[i]` for every index.
pub fn select_labels(labels: &[u8], indices: &[usize]) -> Vec<u8> {
    indices.iter().map(|&i| labels[i]).collect()
}

/// Fails unless `x` and `y` describe the same number of samples.
pub fn check_xy(x: &FeatureMatrix, y: &[u8]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(PhishstackError::Training(format!(
            "{} feature rows but {} labels",
            x.n_rows(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(PhishstackError::Training("empty training set".to_string()));
    }
    if let Some(bad) = y.iter().find(|&&l| l > 1) {
        return Err(PhishstackError::Training(format!(
            "labels must be 0 or 1, found {}",
            bad
        )));
    }
    Ok(())
}
