//! Library-flavoured parameter sets.
//!
//! Each struct exposes the knobs under the names its reference library uses
//! and carries that library's defaults, so a config file only lists overrides.

use super::{BoostingFlavor, BoostingParams, GradientBoostedTrees, GrowthPolicy, RowSampling};
use serde::{Deserialize, Serialize};

/// Symmetric-tree boosting with Bayesian bootstrap.
///
/// There is no seed by default: the bootstrap weights come from OS entropy,
/// so two fits on the same data differ slightly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatBoostParams {
    pub iterations: usize,
    pub depth: usize,
    pub learning_rate: f64,
    pub l2_leaf_reg: f64,
    pub border_count: usize,
    pub bagging_temperature: f64,
    pub random_seed: Option<u64>,
}

impl Default for CatBoostParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            depth: 6,
            learning_rate: 0.03,
            l2_leaf_reg: 3.0,
            border_count: 254,
            bagging_temperature: 1.0,
            random_seed: None,
        }
    }
}

impl CatBoostParams {
    pub fn to_boosting(&self) -> BoostingParams {
        BoostingParams {
            n_estimators: self.iterations,
            learning_rate: self.learning_rate,
            growth: GrowthPolicy::Symmetric,
            max_depth: Some(self.depth),
            max_leaves: None,
            min_child_weight: 0.0,
            min_child_samples: 1,
            gamma: 0.0,
            reg_lambda: self.l2_leaf_reg,
            reg_alpha: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            row_sampling: RowSampling::Bayesian {
                temperature: self.bagging_temperature,
            },
            max_bins: self.border_count + 1,
            seed: self.random_seed,
        }
    }

    pub fn build(&self) -> GradientBoostedTrees {
        GradientBoostedTrees::new(BoostingFlavor::CatBoost, self.to_boosting())
    }
}

/// Leaf-wise boosting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightGbmParams {
    pub n_estimators: usize,
    pub num_leaves: usize,
    pub max_depth: Option<usize>,
    pub learning_rate: f64,
    pub min_child_samples: usize,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub max_bin: usize,
    pub random_state: Option<u64>,
}

impl Default for LightGbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            num_leaves: 31,
            max_depth: None,
            learning_rate: 0.1,
            min_child_samples: 20,
            min_child_weight: 1e-3,
            reg_lambda: 0.0,
            reg_alpha: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            max_bin: 255,
            random_state: Some(42),
        }
    }
}

impl LightGbmParams {
    pub fn to_boosting(&self) -> BoostingParams {
        BoostingParams {
            n_estimators: self.n_estimators,
            learning_rate: self.learning_rate,
            growth: GrowthPolicy::LeafWise,
            max_depth: self.max_depth,
            max_leaves: Some(self.num_leaves),
            min_child_weight: self.min_child_weight,
            min_child_samples: self.min_child_samples,
            gamma: 0.0,
            reg_lambda: self.reg_lambda,
            reg_alpha: self.reg_alpha,
            subsample: self.subsample,
            colsample_bytree: self.colsample_bytree,
            row_sampling: RowSampling::Bernoulli,
            max_bins: self.max_bin,
            seed: self.random_state,
        }
    }

    pub fn build(&self) -> GradientBoostedTrees {
        GradientBoostedTrees::new(BoostingFlavor::LightGbm, self.to_boosting())
    }
}

/// Depth-wise boosting. Defaults are the tuned meta-model constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XgbParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub gamma: f64,
    pub learning_rate: f64,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub max_bin: usize,
    pub random_state: Option<u64>,
}

impl Default for XgbParams {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            max_depth: 4,
            min_child_weight: 1.0,
            gamma: 1.0733768183090244,
            learning_rate: 0.8802067716505722,
            reg_lambda: 15.350787907001227,
            reg_alpha: 6.223308033832504,
            subsample: 0.551810465659073,
            colsample_bytree: 0.8587405278535516,
            max_bin: 256,
            random_state: Some(42),
        }
    }
}

impl XgbParams {
    pub fn to_boosting(&self) -> BoostingParams {
        BoostingParams {
            n_estimators: self.n_estimators,
            learning_rate: self.learning_rate,
            growth: GrowthPolicy::DepthWise,
            max_depth: Some(self.max_depth),
            max_leaves: None,
            min_child_weight: self.min_child_weight,
            min_child_samples: 0,
            gamma: self.gamma,
            reg_lambda: self.reg_lambda,
            reg_alpha: self.reg_alpha,
            subsample: self.subsample,
            colsample_bytree: self.colsample_bytree,
            row_sampling: RowSampling::Bernoulli,
            max_bins: self.max_bin,
            seed: self.random_state,
        }
    }

    pub fn build(&self) -> GradientBoostedTrees {
        GradientBoostedTrees::new(BoostingFlavor::Xgboost, self.to_boosting())
    }
}
