//! Classifier trait shared by every learner in the stack.

use crate::error::{PhishstackError, Result};
use crate::ml::matrix::FeatureMatrix;

/// Decision threshold on the positive-class probability.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A binary classifier producing calibrated positive-class probabilities.
///
/// Implementations are fitted once and are read-only afterwards, so a fitted
/// model can be shared between threads.
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fit on `x` with labels in {0, 1}.
    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()>;

    fn is_fitted(&self) -> bool;

    /// Number of input columns the fitted model expects.
    fn n_features(&self) -> Option<usize>;

    /// P(class = 1) for a single row.
    fn positive_proba(&self, row: &[f64]) -> Result<f64>;

    /// `[P(class=0), P(class=1)]` for every row of `x`.
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<[f64; 2]>> {
        x.rows()
            .map(|row| self.positive_proba(row).map(|p| [1.0 - p, p]))
            .collect()
    }

    /// Hard labels at the 0.5 threshold.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>> {
        x.rows()
            .map(|row| {
                self.positive_proba(row)
                    .map(|p| u8::from(p > DECISION_THRESHOLD))
            })
            .collect()
    }
}

/// Validates a row against the fitted width of a model.
pub(crate) fn check_row(expected: Option<usize>, row: &[f64], model: &'static str) -> Result<()> {
    match expected {
        None => Err(PhishstackError::NotFitted(model)),
        Some(n) if n != row.len() => Err(PhishstackError::ShapeMismatch {
            expected: n,
            actual: row.len(),
        }),
        Some(_) => Ok(()),
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Log-odds of the positive rate, clamped away from the infinities.
pub(crate) fn base_log_odds(y: &[u8]) -> f64 {
    let pos = y.iter().filter(|&&l| l == 1).count() as f64;
    let p = (pos / y.len().max(1) as f64).clamp(1e-6, 1.0 - 1e-6);
    (p / (1.0 - p)).ln()
}
