use crate::error::{PhishstackError, Result};
use crate::ml::matrix::{check_xy, FeatureMatrix};
use crate::ml::models::classifier::{check_row, sigmoid, Classifier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    /// Inverse L2 regularisation strength.
    #[serde(rename = "C", alias = "c")]
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub fit_intercept: bool,
    /// Kept for parity with the other learners; the Newton solver is deterministic.
    pub random_state: Option<u64>,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-8,
            fit_intercept: true,
            random_state: Some(42),
        }
    }
}

impl LogisticParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(PhishstackError::Configuration(
                "logistic C must be positive".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(PhishstackError::Configuration(
                "logistic max_iter must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build(&self) -> LogisticRegression {
        LogisticRegression::new(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedLogistic {
    mean: Vec<f64>,
    scale: Vec<f64>,
    coef: Vec<f64>,
    intercept: f64,
    n_iter: usize,
}

/// L2-regularised logistic regression solved by Newton's method.
///
/// Inputs are standardised internally; the penalty applies to the
/// standardised coefficients and never to the intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    params: LogisticParams,
    fitted: Option<FittedLogistic>,
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    /// Coefficients on standardised inputs.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.coef.as_slice())
    }

    pub fn n_iter(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_iter)
    }
}

fn standardise(x: &FeatureMatrix) -> (Vec<f64>, Vec<f64>) {
    let n = x.n_rows() as f64;
    let mut mean = Vec::with_capacity(x.n_cols());
    let mut scale = Vec::with_capacity(x.n_cols());
    for col in 0..x.n_cols() {
        let values = x.column(col);
        let m = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n;
        let s = var.sqrt();
        mean.push(m);
        scale.push(if s > 0.0 { s } else { 1.0 });
    }
    (mean, scale)
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for k in 0..n {
        let pivot = (k..n).max_by(|&i, &j| a[i][k].abs().total_cmp(&a[j][k].abs()))?;
        if a[pivot][k].abs() < 1e-300 {
            return None;
        }
        a.swap(k, pivot);
        b.swap(k, pivot);
        for i in k + 1..n {
            let factor = a[i][k] / a[k][k];
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                a[i][j] -= factor * a[k][j];
            }
            b[i] -= factor * b[k];
        }
    }
    let mut x = vec![0.0; n];
    for k in (0..n).rev() {
        let tail: f64 = (k + 1..n).map(|j| a[k][j] * x[j]).sum();
        x[k] = (b[k] - tail) / a[k][k];
    }
    Some(x)
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()> {
        check_xy(x, y)?;
        self.params.validate()?;

        let d = x.n_cols();
        let (mean, scale) = standardise(x);
        let z: Vec<Vec<f64>> = x
            .rows()
            .map(|row| (0..d).map(|j| (row[j] - mean[j]) / scale[j]).collect())
            .collect();

        // theta = [coef..., intercept]
        let dim = d + 1;
        let mut theta = vec![0.0; dim];
        let l2 = 1.0 / self.params.c;
        let mut n_iter = 0;

        for iter in 0..self.params.max_iter {
            n_iter = iter + 1;
            let mut grad = vec![0.0; dim];
            let mut hess = vec![vec![0.0; dim]; dim];

            for (row, &label) in z.iter().zip(y) {
                let score = theta[d] + row.iter().zip(&theta).map(|(v, w)| v * w).sum::<f64>();
                let p = sigmoid(score);
                let residual = p - f64::from(label);
                let weight = (p * (1.0 - p)).max(1e-12);
                for j in 0..d {
                    grad[j] += residual * row[j];
                    for k in 0..=j {
                        hess[j][k] += weight * row[j] * row[k];
                    }
                    hess[d][j] += weight * row[j];
                }
                grad[d] += residual;
                hess[d][d] += weight;
            }

            for j in 0..d {
                grad[j] += l2 * theta[j];
                hess[j][j] += l2;
            }
            if !self.params.fit_intercept {
                grad[d] = 0.0;
                hess[d] = vec![0.0; dim];
                hess[d][d] = 1.0;
            }
            for j in 0..dim {
                for k in j + 1..dim {
                    hess[j][k] = hess[k][j];
                }
            }

            let step = solve(hess, grad).ok_or_else(|| {
                PhishstackError::Training("logistic regression Hessian is singular".to_string())
            })?;
            let mut max_step: f64 = 0.0;
            for (t, s) in theta.iter_mut().zip(&step) {
                *t -= s;
                max_step = max_step.max(s.abs());
            }
            if max_step < self.params.tol {
                break;
            }
        }

        if n_iter == self.params.max_iter {
            log::debug!("logistic: stopped at max_iter={}", n_iter);
        }

        let intercept = theta[d];
        theta.truncate(d);
        self.fitted = Some(FittedLogistic {
            mean,
            scale,
            coef: theta,
            intercept,
            n_iter,
        });
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.coef.len())
    }

    fn positive_proba(&self, row: &[f64]) -> Result<f64> {
        check_row(self.n_features(), row, "logistic")?;
        let f = self
            .fitted
            .as_ref()
            .ok_or(PhishstackError::NotFitted("logistic"))?;
        let score = f.intercept
            + row
                .iter()
                .enumerate()
                .map(|(j, v)| f.coef[j] * (v - f.mean[j]) / f.scale[j])
                .sum::<f64>();
        Ok(sigmoid(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_orders_by_signal() {
        let rows: Vec<[f64; 2]> = (0..100).map(|i| [i as f64, (i % 3) as f64]).collect();
        let y: Vec<u8> = (0..100).map(|i| u8::from(i >= 50)).collect();
        let x = FeatureMatrix::from_rows(2, &rows).unwrap();

        let mut model = LogisticParams::default().build();
        model.fit(&x, &y).unwrap();

        let low = model.positive_proba(&[5.0, 1.0]).unwrap();
        let high = model.positive_proba(&[95.0, 1.0]).unwrap();
        assert!(low < 0.1);
        assert!(high > 0.9);
        assert!(model.coefficients().unwrap()[0] > 0.0);
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let x = FeatureMatrix::from_rows(1, &[[0.0], [1.0], [2.0], [3.0]]).unwrap();
        let mut model = LogisticParams::default().build();
        model.fit(&x, &[0, 0, 1, 1]).unwrap();
        let p = model.positive_proba(&[10.0]).unwrap();
        assert!(p.is_finite() && p > 0.5);
    }

    #[test]
    fn test_iteration_count_respects_max_iter() {
        let x = FeatureMatrix::from_rows(1, &[[0.0], [1.0], [2.0], [3.0], [1.5], [2.5]]).unwrap();
        let y = [0, 0, 1, 1, 1, 0];

        let mut capped = LogisticParams {
            max_iter: 1,
            ..Default::default()
        }
        .build();
        assert_eq!(capped.n_iter(), None);
        capped.fit(&x, &y).unwrap();
        assert_eq!(capped.n_iter(), Some(1));

        let mut model = LogisticParams::default().build();
        model.fit(&x, &y).unwrap();
        let n = model.n_iter().unwrap();
        assert!(n >= 1 && n <= 100);
    }

    #[test]
    fn test_constant_column_is_harmless() {
        let x = FeatureMatrix::from_rows(2, &[[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]]).unwrap();
        let mut model = LogisticParams::default().build();
        assert!(model.fit(&x, &[0, 0, 1, 1]).is_ok());
    }
}
