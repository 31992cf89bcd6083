use crate::error::{PhishstackError, Result};
use crate::ml::matrix::FeatureMatrix;
use crate::ml::models::{
    CatBoostParams, Classifier, ForestParams, GradientBoostedTrees, LightGbmParams,
    LogisticParams, LogisticRegression, RandomForest,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseModelKind {
    CatBoost,
    RandomForest,
    LightGbm,
    Logistic,
}

impl BaseModelKind {
    /// Column order of the meta-feature vector. Changing it invalidates every
    /// previously trained meta model.
    pub const CANONICAL_ORDER: [BaseModelKind; 4] = [
        BaseModelKind::CatBoost,
        BaseModelKind::RandomForest,
        BaseModelKind::LightGbm,
        BaseModelKind::Logistic,
    ];

    /// Column of this kind in the full meta-feature vector.
    pub fn canonical_index(&self) -> usize {
        match self {
            Self::CatBoost => 0,
            Self::RandomForest => 1,
            Self::LightGbm => 2,
            Self::Logistic => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CatBoost => "catboost",
            Self::RandomForest => "randomforest",
            Self::LightGbm => "lightgbm",
            Self::Logistic => "logistic",
        }
    }
}

impl fmt::Display for BaseModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the ordered base-model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BaseModelSpec {
    CatBoost(CatBoostParams),
    RandomForest(ForestParams),
    LightGbm(LightGbmParams),
    Logistic(LogisticParams),
}

impl BaseModelSpec {
    pub fn kind(&self) -> BaseModelKind {
        match self {
            Self::CatBoost(_) => BaseModelKind::CatBoost,
            Self::RandomForest(_) => BaseModelKind::RandomForest,
            Self::LightGbm(_) => BaseModelKind::LightGbm,
            Self::Logistic(_) => BaseModelKind::Logistic,
        }
    }

    /// Fresh, unfitted classifier for this entry.
    pub fn build(&self) -> BaseClassifier {
        match self {
            Self::CatBoost(p) => BaseClassifier::Boosted(p.build()),
            Self::RandomForest(p) => BaseClassifier::Forest(p.build()),
            Self::LightGbm(p) => BaseClassifier::Boosted(p.build()),
            Self::Logistic(p) => BaseClassifier::Logistic(p.build()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::CatBoost(p) => p.to_boosting().validate(),
            Self::RandomForest(p) => p.validate(),
            Self::LightGbm(p) => p.to_boosting().validate(),
            Self::Logistic(p) => p.validate(),
        }
    }

    /// The four base models with library defaults, in canonical order.
    pub fn default_stack() -> Vec<BaseModelSpec> {
        vec![
            Self::CatBoost(CatBoostParams::default()),
            Self::RandomForest(ForestParams::default()),
            Self::LightGbm(LightGbmParams::default()),
            Self::Logistic(LogisticParams::default()),
        ]
    }
}

/// Rejects empty or duplicated base-model lists and lists that break
/// canonical order. A subset is accepted as long as its relative order holds.
pub fn validate_stack(specs: &[BaseModelSpec]) -> Result<()> {
    if specs.is_empty() {
        return Err(PhishstackError::Configuration(
            "at least one base model is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    let mut previous: Option<BaseModelKind> = None;
    for spec in specs {
        let kind = spec.kind();
        if !seen.insert(kind) {
            return Err(PhishstackError::Configuration(format!(
                "base model '{}' listed twice",
                kind
            )));
        }
        if let Some(prev) = previous {
            if kind.canonical_index() < prev.canonical_index() {
                return Err(PhishstackError::Configuration(format!(
                    "base model '{}' must come before '{}' (order is {})",
                    kind,
                    prev,
                    canonical_order_names()
                )));
            }
        }
        previous = Some(kind);
        spec.validate()?;
    }
    Ok(())
}

/// Requires exactly the four base models in canonical order, as served
/// models and their config must have.
pub fn require_full_stack(kinds: &[BaseModelKind]) -> Result<()> {
    if kinds != BaseModelKind::CANONICAL_ORDER {
        let got: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        return Err(PhishstackError::Configuration(format!(
            "base models must be [{}], got [{}]",
            canonical_order_names(),
            got.join(", ")
        )));
    }
    Ok(())
}

fn canonical_order_names() -> String {
    BaseModelKind::CANONICAL_ORDER
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "model", rename_all = "snake_case")]
pub enum BaseClassifier {
    Boosted(GradientBoostedTrees),
    Forest(RandomForest),
    Logistic(LogisticRegression),
}

impl BaseClassifier {
    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::Boosted(m) => m as &dyn Classifier,
            Self::Forest(m) => m as &dyn Classifier,
            Self::Logistic(m) => m as &dyn Classifier,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Self::Boosted(m) => m as &mut dyn Classifier,
            Self::Forest(m) => m as &mut dyn Classifier,
            Self::Logistic(m) => m as &mut dyn Classifier,
        }
    }
}

impl Classifier for BaseClassifier {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn positive_proba(&self, row: &[f64]) -> Result<f64> {
        self.inner().positive_proba(row)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedModel {
    pub kind: BaseModelKind,
    pub model: BaseClassifier,
}

/// Fitted first-layer models in meta-feature column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseModelLayer {
    models: Vec<NamedModel>,
}

impl BaseModelLayer {
    /// Fits every spec independently on the same `(x, y)`.
    ///
    /// With `parallel`, models are fitted on the rayon pool; the result keeps
    /// the order of `specs` either way.
    pub fn fit(specs: &[BaseModelSpec], x: &FeatureMatrix, y: &[u8], parallel: bool) -> Result<Self> {
        validate_stack(specs)?;
        let fitted: Vec<Result<NamedModel>> = if parallel {
            specs.par_iter().map(|spec| fit_one(spec, x, y)).collect()
        } else {
            specs.iter().map(|spec| fit_one(spec, x, y)).collect()
        };
        let models = fitted.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(Self { models })
    }

    pub fn models(&self) -> &[NamedModel] {
        &self.models
    }

    pub fn kinds(&self) -> Vec<BaseModelKind> {
        self.models.iter().map(|m| m.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Input width shared by all base models.
    pub fn n_features(&self) -> Option<usize> {
        self.models.first().and_then(|m| m.model.n_features())
    }
}

fn fit_one(spec: &BaseModelSpec, x: &FeatureMatrix, y: &[u8]) -> Result<NamedModel> {
    let kind = spec.kind();
    log::info!("Fitting base model {} on {} rows", kind, x.n_rows());
    let mut model = spec.build();
    model.fit(x, y)?;
    Ok(NamedModel { kind, model })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stack_is_canonical_order() {
        let kinds: Vec<_> = BaseModelSpec::default_stack().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, BaseModelKind::CANONICAL_ORDER.to_vec());
    }

    #[test]
    fn test_duplicate_kinds_rejected() {
        let specs = vec![
            BaseModelSpec::Logistic(LogisticParams::default()),
            BaseModelSpec::Logistic(LogisticParams::default()),
        ];
        assert!(validate_stack(&specs).is_err());
        assert!(validate_stack(&[]).is_err());
    }

    #[test]
    fn test_out_of_order_stack_rejected() {
        let specs = vec![
            BaseModelSpec::Logistic(LogisticParams::default()),
            BaseModelSpec::RandomForest(ForestParams::default()),
        ];
        assert!(matches!(
            validate_stack(&specs),
            Err(PhishstackError::Configuration(_))
        ));

        let subset = vec![
            BaseModelSpec::RandomForest(ForestParams::default()),
            BaseModelSpec::Logistic(LogisticParams::default()),
        ];
        assert!(validate_stack(&subset).is_ok());
    }

    #[test]
    fn test_full_stack_required_for_serving() {
        assert!(require_full_stack(&BaseModelKind::CANONICAL_ORDER).is_ok());
        assert!(require_full_stack(&[BaseModelKind::RandomForest, BaseModelKind::Logistic]).is_err());
        let mut swapped = BaseModelKind::CANONICAL_ORDER;
        swapped.swap(0, 1);
        assert!(require_full_stack(&swapped).is_err());
    }

    #[test]
    fn test_spec_serde_uses_kind_tag() {
        let spec = BaseModelSpec::RandomForest(ForestParams::default());
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "randomforest");
        let back: BaseModelSpec =
            serde_json::from_str(r#"{"kind":"lightgbm","n_estimators":7}"#).unwrap();
        match back {
            BaseModelSpec::LightGbm(p) => {
                assert_eq!(p.n_estimators, 7);
                assert_eq!(p.num_leaves, 31);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_layer_preserves_spec_order() {
        let x = FeatureMatrix::from_rows(1, &[[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]]).unwrap();
        let y = [0, 0, 0, 1, 1, 1];
        let specs = vec![
            BaseModelSpec::RandomForest(ForestParams {
                n_estimators: 5,
                ..Default::default()
            }),
            BaseModelSpec::Logistic(LogisticParams::default()),
        ];
        let seq = BaseModelLayer::fit(&specs, &x, &y, false).unwrap();
        let par = BaseModelLayer::fit(&specs, &x, &y, true).unwrap();
        assert_eq!(seq.kinds(), vec![BaseModelKind::RandomForest, BaseModelKind::Logistic]);
        assert_eq!(seq, par);
        assert_eq!(seq.n_features(), Some(1));
    }
}
