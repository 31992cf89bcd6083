use super::artifact::TrainedPipeline;
use crate::config::ExtractionConfig;
use crate::error::{PhishstackError, Result};
use crate::features::{normalize_url, FeatureExtractionDegraded, FeatureExtractor};
use crate::ml::stacking::{MetaFeatureVector, StackedPrediction};
use crate::types::{FeatureVector, Label};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub url: String,
    pub features: FeatureVector,
    pub meta_features: MetaFeatureVector,
    pub label: Label,
    pub p_legitimate: f64,
    pub p_phishing: f64,
    pub degraded: Vec<FeatureExtractionDegraded>,
}

impl PredictionResult {
    pub fn confidence(&self) -> f64 {
        self.p_legitimate.max(self.p_phishing)
    }

    pub fn is_phishing(&self) -> bool {
        self.label == Label::Phishing
    }
}

/// Serving entry point: URL in, label and class probabilities out.
#[derive(Clone)]
pub struct PhishingDetector {
    pipeline: Option<Arc<TrainedPipeline>>,
    extractor: FeatureExtractor,
}

impl PhishingDetector {
    /// Detector with no model; `predict` fails with `ModelNotLoaded` until
    /// [`load_model`](Self::load_model) succeeds.
    pub fn unloaded(extractor: FeatureExtractor) -> Self {
        Self {
            pipeline: None,
            extractor,
        }
    }

    pub fn from_pipeline(pipeline: Arc<TrainedPipeline>, extractor: FeatureExtractor) -> Self {
        Self {
            pipeline: Some(pipeline),
            extractor,
        }
    }

    /// Loads an artifact and pairs it with live network lookups.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let lookup = ExtractionConfig::default().build_lookup();
        Self::load_with(path, FeatureExtractor::new(Arc::new(lookup)))
    }

    pub fn load_with<P: AsRef<Path>>(path: P, extractor: FeatureExtractor) -> Result<Self> {
        let mut detector = Self::unloaded(extractor);
        detector.load_model(path)?;
        Ok(detector)
    }

    /// Replaces the current model. Any failure leaves the detector as it was.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let pipeline = TrainedPipeline::load(path).map_err(|e| {
            PhishstackError::ModelNotLoaded(format!("{}: {}", path.display(), e))
        })?;
        self.pipeline = Some(Arc::new(pipeline));
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn pipeline(&self) -> Option<&Arc<TrainedPipeline>> {
        self.pipeline.as_ref()
    }

    pub fn extract_features(&self, url: &str) -> FeatureVector {
        self.extractor.extract(url)
    }

    /// Scores a precomputed feature vector.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<StackedPrediction> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| PhishstackError::ModelNotLoaded("no model loaded".to_string()))?;
        guarded("scoring features", || pipeline.predict(features))
    }

    /// Extracts features from `url` as given and scores them.
    ///
    /// A panic anywhere in extraction or scoring comes back as
    /// `PhishstackError::Prediction`.
    pub fn predict(&self, url: &str) -> Result<PredictionResult> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or_else(|| PhishstackError::ModelNotLoaded("no model loaded".to_string()))?;
        guarded("analyzing url", || {
            let report = self.extractor.extract_with_report(url);
            let pred = pipeline.predict(&report.features)?;
            Ok((report, pred))
        })
        .map(|(report, pred)| {
            log::info!(
                "{} -> {} (p_phishing {:.4})",
                url,
                pred.label,
                pred.p_phishing
            );
            PredictionResult {
                url: url.to_string(),
                features: report.features,
                meta_features: pred.meta_features,
                label: pred.label,
                p_legitimate: pred.p_legitimate,
                p_phishing: pred.p_phishing,
                degraded: report.degraded,
            }
        })
    }

    /// Front-end entry: normalises raw user input, then [`predict`](Self::predict).
    pub fn analyze(&self, raw: &str) -> Result<PredictionResult> {
        self.predict(&normalize_url(raw))
    }
}

/// Runs `f`, turning any error or panic into `PhishstackError::Prediction`.
fn guarded<T>(what: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(PhishstackError::Prediction(msg))) => Err(PhishstackError::Prediction(msg)),
        Ok(Err(e)) => Err(PhishstackError::Prediction(e.to_string())),
        Err(_) => {
            log::error!("internal fault while {}", what);
            Err(PhishstackError::Prediction(format!(
                "internal fault while {}",
                what
            )))
        }
    }
}
