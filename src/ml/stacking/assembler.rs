use super::base_layer::{BaseModelKind, BaseModelLayer};
use crate::error::{PhishstackError, Result};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::Classifier;
use serde::{Deserialize, Serialize};

/// Positive-class probabilities of the base models, one per model in layer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFeatureVector {
    kinds: Vec<BaseModelKind>,
    values: Vec<f64>,
}

impl MetaFeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn kinds(&self) -> &[BaseModelKind] {
        &self.kinds
    }

    pub fn get(&self, kind: BaseModelKind) -> Option<f64> {
        self.kinds
            .iter()
            .position(|&k| k == kind)
            .map(|i| self.values[i])
    }

    pub fn named_values(&self) -> impl Iterator<Item = (BaseModelKind, f64)> + '_ {
        self.kinds.iter().copied().zip(self.values.iter().copied())
    }
}

/// Builds meta-features from a fitted base layer.
///
/// Pure with respect to the layer: the same layer and input always give the
/// same output.
pub struct MetaFeatureAssembler;

impl MetaFeatureAssembler {
    pub fn assemble_row(layer: &BaseModelLayer, row: &[f64]) -> Result<MetaFeatureVector> {
        let mut values = Vec::with_capacity(layer.len());
        for named in layer.models() {
            let p = named.model.positive_proba(row)?;
            values.push(check_probability(named.kind, p)?);
        }
        Ok(MetaFeatureVector {
            kinds: layer.kinds(),
            values,
        })
    }

    /// One meta-feature row per input row; columns follow layer order.
    pub fn assemble(layer: &BaseModelLayer, x: &FeatureMatrix) -> Result<FeatureMatrix> {
        let mut meta = FeatureMatrix::new(layer.len());
        for row in x.rows() {
            let mfv = Self::assemble_row(layer, row)?;
            meta.push_row(mfv.values())?;
        }
        Ok(meta)
    }
}

fn check_probability(kind: BaseModelKind, p: f64) -> Result<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(PhishstackError::Prediction(format!(
            "base model {} produced invalid probability {}",
            kind, p
        )))
    }
}
