//! Two-layer stacked ensemble: base models feed a meta model through a
//! fixed-order vector of positive-class probabilities.

pub mod assembler;
pub mod base_layer;
pub mod meta_model;

pub use assembler::{MetaFeatureAssembler, MetaFeatureVector};
pub use base_layer::{
    require_full_stack, validate_stack, BaseClassifier, BaseModelKind, BaseModelLayer, BaseModelSpec, NamedModel,
};
pub use meta_model::MetaModel;

use crate::error::{PhishstackError, Result};
use crate::ml::models::Classifier;
use crate::types::Label;
use serde::{Deserialize, Serialize};

/// Outcome of scoring one feature row through both layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedPrediction {
    pub label: Label,
    pub p_legitimate: f64,
    pub p_phishing: f64,
    pub meta_features: MetaFeatureVector,
}

/// Fitted base layer plus the meta model trained on its outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingClassifier {
    base: BaseModelLayer,
    meta: MetaModel,
}

impl StackingClassifier {
    /// Pairs a base layer with a meta model, checking that the meta model
    /// consumes exactly one column per base model.
    pub fn new(base: BaseModelLayer, meta: MetaModel) -> Result<Self> {
        let stack = Self { base, meta };
        stack.validate()?;
        Ok(stack)
    }

    /// Checks the layer contract: every base model fitted on the same width,
    /// no kind listed twice, one meta input per base model.
    pub fn validate(&self) -> Result<()> {
        if self.base.is_empty() {
            return Err(PhishstackError::NotFitted("base layer"));
        }
        let width = self.base.n_features();
        let mut seen = std::collections::HashSet::new();
        for named in self.base.models() {
            if !named.model.is_fitted() {
                return Err(PhishstackError::NotFitted(named.kind.as_str()));
            }
            if !seen.insert(named.kind) {
                return Err(PhishstackError::Prediction(format!(
                    "base model '{}' appears twice",
                    named.kind
                )));
            }
            if named.model.n_features() != width {
                return Err(PhishstackError::ShapeMismatch {
                    expected: width.unwrap_or(0),
                    actual: named.model.n_features().unwrap_or(0),
                });
            }
        }
        if !self.meta.is_trained() {
            return Err(PhishstackError::NotFitted("meta model"));
        }
        if self.meta.n_inputs() != Some(self.base.len()) {
            return Err(PhishstackError::ShapeMismatch {
                expected: self.base.len(),
                actual: self.meta.n_inputs().unwrap_or(0),
            });
        }
        Ok(())
    }

    pub fn base_layer(&self) -> &BaseModelLayer {
        &self.base
    }

    pub fn meta_model(&self) -> &MetaModel {
        &self.meta
    }

    pub fn n_features(&self) -> Option<usize> {
        self.base.n_features()
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<StackedPrediction> {
        let meta_features = MetaFeatureAssembler::assemble_row(&self.base, row)?;
        let [p_legitimate, p_phishing] = self.meta.predict_proba_row(meta_features.values())?;
        if !(p_legitimate.is_finite() && p_phishing.is_finite()) {
            return Err(PhishstackError::Prediction(
                "meta model produced a non-finite probability".to_string(),
            ));
        }
        let label = if p_phishing > crate::ml::models::DECISION_THRESHOLD {
            Label::Phishing
        } else {
            Label::Legitimate
        };
        Ok(StackedPrediction {
            label,
            p_legitimate,
            p_phishing,
            meta_features,
        })
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> Result<[f64; 2]> {
        let pred = self.predict_row(row)?;
        Ok([pred.p_legitimate, pred.p_phishing])
    }
}
