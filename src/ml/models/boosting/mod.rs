//! Second-order gradient boosting on the logistic loss.
//!
//! One engine serves three tree-growth styles:
//! - [`GrowthPolicy::Symmetric`]: oblivious trees with Bayesian bootstrap (CatBoost style)
//! - [`GrowthPolicy::LeafWise`]: best-first growth bounded by a leaf count (LightGBM style)
//! - [`GrowthPolicy::DepthWise`]: level-by-level growth bounded by depth (XGBoost style)
//!
//! Split search runs on quantile histograms; fitted trees store raw-value
//! thresholds so prediction never needs the binner.

mod flavors;
mod grower;

pub use flavors::{CatBoostParams, LightGbmParams, XgbParams};

use crate::error::{PhishstackError, Result};
use crate::ml::matrix::{check_xy, FeatureMatrix};
use crate::ml::models::binning::FeatureBinner;
use crate::ml::models::classifier::{base_log_odds, check_row, sigmoid, Classifier};
use crate::ml::models::tree::Tree;
use grower::GrowContext;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    DepthWise,
    LeafWise,
    Symmetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSampling {
    /// Keep each row with probability `subsample`.
    Bernoulli,
    /// Weight each row by `(-ln u)^temperature`, `u ~ U(0, 1]`.
    Bayesian { temperature: f64 },
}

/// Engine-level boosting parameters. Library-flavoured presets convert into
/// this type, see [`CatBoostParams`], [`LightGbmParams`] and [`XgbParams`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub growth: GrowthPolicy,
    pub max_depth: Option<usize>,
    pub max_leaves: Option<usize>,
    pub min_child_weight: f64,
    pub min_child_samples: usize,
    /// Minimum loss reduction required to split.
    pub gamma: f64,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub row_sampling: RowSampling,
    pub max_bins: usize,
    /// `None` draws the sampling seed from OS entropy.
    pub seed: Option<u64>,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            growth: GrowthPolicy::DepthWise,
            max_depth: Some(6),
            max_leaves: None,
            min_child_weight: 1.0,
            min_child_samples: 0,
            gamma: 0.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            row_sampling: RowSampling::Bernoulli,
            max_bins: 256,
            seed: Some(0),
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(PhishstackError::Configuration(msg.to_string()));
        if self.n_estimators == 0 {
            return fail("n_estimators must be positive");
        }
        if !(self.learning_rate > 0.0) {
            return fail("learning_rate must be positive");
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return fail("subsample must be in (0, 1]");
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return fail("colsample_bytree must be in (0, 1]");
        }
        if self.reg_lambda < 0.0 || self.reg_alpha < 0.0 || self.gamma < 0.0 {
            return fail("regularisation terms must be non-negative");
        }
        if self.max_bins < 2 {
            return fail("max_bins must be at least 2");
        }
        if self.growth == GrowthPolicy::Symmetric && self.max_depth.is_none() {
            return fail("symmetric trees need a max_depth");
        }
        if let RowSampling::Bayesian { temperature } = self.row_sampling {
            if temperature < 0.0 {
                return fail("bagging temperature must be non-negative");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostingFlavor {
    CatBoost,
    LightGbm,
    Xgboost,
}

impl BoostingFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatBoost => "catboost",
            Self::LightGbm => "lightgbm",
            Self::Xgboost => "xgboost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedEnsemble {
    n_features: usize,
    base_score: f64,
    trees: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    flavor: BoostingFlavor,
    params: BoostingParams,
    fitted: Option<FittedEnsemble>,
}

impl GradientBoostedTrees {
    pub fn new(flavor: BoostingFlavor, params: BoostingParams) -> Self {
        Self {
            flavor,
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.trees.len())
    }

    /// Raw additive score (log-odds) for one row.
    pub fn decision_function(&self, row: &[f64]) -> Result<f64> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(PhishstackError::NotFitted(self.flavor.as_str()))?;
        check_row(Some(fitted.n_features), row, self.flavor.as_str())?;
        Ok(fitted.base_score + fitted.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    fn sample_rows(&self, rng: &mut StdRng, n: usize, grad: &[f64], hess: &[f64], wgrad: &mut [f64], whess: &mut [f64]) -> Vec<u32> {
        match self.params.row_sampling {
            RowSampling::Bernoulli => {
                wgrad.copy_from_slice(grad);
                whess.copy_from_slice(hess);
                if self.params.subsample >= 1.0 {
                    (0..n as u32).collect()
                } else {
                    (0..n as u32)
                        .filter(|_| rng.gen::<f64>() < self.params.subsample)
                        .collect()
                }
            }
            RowSampling::Bayesian { temperature } => {
                for i in 0..n {
                    let u = 1.0 - rng.gen::<f64>();
                    let w = if temperature == 0.0 {
                        1.0
                    } else {
                        (-u.ln()).powf(temperature)
                    };
                    wgrad[i] = grad[i] * w;
                    whess[i] = hess[i] * w;
                }
                (0..n as u32).collect()
            }
        }
    }
}

fn sample_columns(rng: &mut StdRng, n_cols: usize, fraction: f64) -> Vec<usize> {
    let mut cols: Vec<usize> = (0..n_cols).collect();
    if fraction >= 1.0 {
        return cols;
    }
    let keep = ((fraction * n_cols as f64).round() as usize).clamp(1, n_cols);
    cols.shuffle(rng);
    cols.truncate(keep);
    cols.sort_unstable();
    cols
}

impl Classifier for GradientBoostedTrees {
    fn name(&self) -> &'static str {
        self.flavor.as_str()
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()> {
        check_xy(x, y)?;
        self.params.validate()?;

        let n = x.n_rows();
        let binner = FeatureBinner::fit(x, self.params.max_bins);
        let binned = binner.transform(x);
        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let base_score = base_log_odds(y);
        let mut raw = vec![base_score; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut wgrad = vec![0.0; n];
        let mut whess = vec![0.0; n];
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for round in 0..self.params.n_estimators {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                grad[i] = p - f64::from(y[i]);
                hess[i] = (p * (1.0 - p)).max(1e-16);
            }

            let rows = self.sample_rows(&mut rng, n, &grad, &hess, &mut wgrad, &mut whess);
            let cols = sample_columns(&mut rng, x.n_cols(), self.params.colsample_bytree);
            if rows.is_empty() {
                continue;
            }

            let ctx = GrowContext {
                binned: &binned,
                binner: &binner,
                grad: &wgrad,
                hess: &whess,
                cols: &cols,
                params: &self.params,
            };
            let tree = match self.params.growth {
                GrowthPolicy::DepthWise => Tree::Binary(ctx.grow_depth_wise(rows)),
                GrowthPolicy::LeafWise => Tree::Binary(ctx.grow_leaf_wise(rows)),
                GrowthPolicy::Symmetric => Tree::Oblivious(ctx.grow_symmetric(rows)),
            };

            for (i, score) in raw.iter_mut().enumerate() {
                *score += tree.predict(x.row(i));
            }
            trees.push(tree);

            if (round + 1) % 100 == 0 {
                log::debug!("{}: {} trees grown", self.flavor.as_str(), round + 1);
            }
        }

        self.fitted = Some(FittedEnsemble {
            n_features: x.n_cols(),
            base_score,
            trees,
        });
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    fn positive_proba(&self, row: &[f64]) -> Result<f64> {
        self.decision_function(row).map(sigmoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two noisy clusters separated on column 0.
    fn clusters(n: usize) -> (FeatureMatrix, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut x = FeatureMatrix::new(3);
        let mut y = Vec::new();
        for i in 0..n {
            let label = (i % 2) as u8;
            let center = if label == 1 { 10.0 } else { 0.0 };
            x.push_row(&[
                center + rng.gen_range(-3.0..3.0),
                rng.gen_range(0.0..5.0),
                rng.gen_range(0.0..5.0),
            ])
            .unwrap();
            y.push(label);
        }
        (x, y)
    }

    fn accuracy(model: &GradientBoostedTrees, x: &FeatureMatrix, y: &[u8]) -> f64 {
        let pred = model.predict(x).unwrap();
        pred.iter().zip(y).filter(|(p, t)| p == t).count() as f64 / y.len() as f64
    }

    #[test]
    fn test_each_growth_policy_learns_clusters() {
        let (x, y) = clusters(300);
        let presets = [
            CatBoostParams {
                iterations: 50,
                random_seed: Some(1),
                ..Default::default()
            }
            .build(),
            LightGbmParams {
                n_estimators: 30,
                ..Default::default()
            }
            .build(),
            XgbParams {
                n_estimators: 30,
                ..Default::default()
            }
            .build(),
        ];
        for mut model in presets {
            model.fit(&x, &y).unwrap();
            assert!(accuracy(&model, &x, &y) > 0.95, "{} underfits", model.name());
        }
    }

    #[test]
    fn test_probabilities_are_bounded() {
        let (x, y) = clusters(100);
        let mut model = LightGbmParams::default().build();
        model.fit(&x, &y).unwrap();
        for [p0, p1] in model.predict_proba(&x).unwrap() {
            assert!((0.0..=1.0).contains(&p1));
            assert!((p0 + p1 - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let (x, y) = clusters(120);
        let mut a = XgbParams::default().build();
        let mut b = XgbParams::default().build();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unfitted_model_errors() {
        let model = XgbParams::default().build();
        assert!(matches!(
            model.positive_proba(&[0.0, 0.0, 0.0]),
            Err(PhishstackError::NotFitted(_))
        ));
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let (x, y) = clusters(60);
        let mut model = LightGbmParams::default().build();
        model.fit(&x, &y).unwrap();
        assert!(matches!(
            model.positive_proba(&[1.0]),
            Err(PhishstackError::ShapeMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_column_sampling_keeps_at_least_one() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(sample_columns(&mut rng, 4, 0.01).len(), 1);
        assert_eq!(sample_columns(&mut rng, 6, 0.8587405278535516).len(), 5);
        assert_eq!(sample_columns(&mut rng, 6, 1.0), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = BoostingParams {
            subsample: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
