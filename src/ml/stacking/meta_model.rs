use crate::error::{PhishstackError, Result};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::{Classifier, GradientBoostedTrees, XgbParams, DECISION_THRESHOLD};
use crate::types::Label;
use serde::{Deserialize, Serialize};

/// Second-layer classifier over base-model probabilities.
///
/// A single depth-wise booster with frozen hyperparameters; see [`XgbParams`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaModel {
    booster: GradientBoostedTrees,
}

impl MetaModel {
    pub fn new(params: &XgbParams) -> Self {
        Self {
            booster: params.build(),
        }
    }

    pub fn fit(&mut self, meta_x: &FeatureMatrix, y: &[u8]) -> Result<()> {
        log::info!(
            "Fitting meta model on {} rows x {} meta-features",
            meta_x.n_rows(),
            meta_x.n_cols()
        );
        self.booster.fit(meta_x, y)
    }

    pub fn is_trained(&self) -> bool {
        self.booster.is_fitted()
    }

    /// Number of meta-features the model was trained on.
    pub fn n_inputs(&self) -> Option<usize> {
        self.booster.n_features()
    }

    pub fn n_trees(&self) -> usize {
        self.booster.n_trees()
    }

    /// `[P(legitimate), P(phishing)]` for one meta-feature row.
    pub fn predict_proba_row(&self, meta_row: &[f64]) -> Result<[f64; 2]> {
        if !self.is_trained() {
            return Err(PhishstackError::NotFitted("meta model"));
        }
        let p = self.booster.positive_proba(meta_row)?;
        Ok([1.0 - p, p])
    }

    pub fn predict_row(&self, meta_row: &[f64]) -> Result<Label> {
        let [_, p1] = self.predict_proba_row(meta_row)?;
        Ok(if p1 > DECISION_THRESHOLD {
            Label::Phishing
        } else {
            Label::Legitimate
        })
    }

    pub fn predict_proba(&self, meta_x: &FeatureMatrix) -> Result<Vec<[f64; 2]>> {
        meta_x.rows().map(|r| self.predict_proba_row(r)).collect()
    }

    pub fn predict(&self, meta_x: &FeatureMatrix) -> Result<Vec<Label>> {
        meta_x.rows().map(|r| self.predict_row(r)).collect()
    }
}
