use crate::error::{PhishstackError, Result};
use crate::ml::stacking::{require_full_stack, BaseModelKind, StackedPrediction, StackingClassifier};
use crate::ml::training::{EvaluationReport, StackingMethod};
use crate::types::{FeatureVector, FEATURE_NAMES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Bumped whenever the serialized layout changes incompatibly.
pub const ARTIFACT_FORMAT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
    pub stacking: StackingMethod,
    pub n_train: usize,
    pub n_test: usize,
    pub test_accuracy: f64,
}

/// Everything needed to serve predictions, persisted as one JSON document.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    format: u32,
    feature_names: Vec<String>,
    classifier: StackingClassifier,
    metadata: ArtifactMetadata,
}

impl TrainedPipeline {
    pub fn new(classifier: StackingClassifier, report: &EvaluationReport) -> Result<Self> {
        let pipeline = Self {
            format: ARTIFACT_FORMAT,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classifier,
            metadata: ArtifactMetadata {
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: Utc::now(),
                stacking: report.stacking,
                n_train: report.n_train,
                n_test: report.n_test,
                test_accuracy: report.stacked.accuracy,
            },
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classifier(&self) -> &StackingClassifier {
        &self.classifier
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn base_kinds(&self) -> Vec<BaseModelKind> {
        self.classifier.base_layer().kinds()
    }

    /// Rejects artifacts whose feature list or layer shapes do not line up.
    pub fn validate(&self) -> Result<()> {
        if self.format != ARTIFACT_FORMAT {
            return Err(PhishstackError::DataSchema(format!(
                "unsupported artifact format {} (expected {})",
                self.format, ARTIFACT_FORMAT
            )));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(PhishstackError::DataSchema(format!(
                "artifact feature list {:?} does not match {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        self.classifier.validate()?;
        require_full_stack(&self.base_kinds())
            .map_err(|e| PhishstackError::DataSchema(e.to_string()))?;
        if self.classifier.n_features() != Some(FEATURE_NAMES.len()) {
            return Err(PhishstackError::ShapeMismatch {
                expected: FEATURE_NAMES.len(),
                actual: self.classifier.n_features().unwrap_or(0),
            });
        }
        Ok(())
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<StackedPrediction> {
        self.classifier.predict_row(&features.to_row())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        log::info!(
            "Saved pipeline ({} base models) to {}",
            self.classifier.base_layer().len(),
            path.display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let pipeline: Self = serde_json::from_reader(reader)?;
        pipeline.validate()?;
        log::info!(
            "Loaded pipeline from {} (trained {}, {})",
            path.display(),
            pipeline.metadata.created_at.format("%Y-%m-%d %H:%M"),
            pipeline.metadata.stacking
        );
        Ok(pipeline)
    }
}
