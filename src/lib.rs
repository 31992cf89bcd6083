//! Phishing URL detection with a stacked ensemble.
//!
//! Six lexical and network features are extracted from a URL, scored by
//! four base classifiers, and their phishing probabilities are combined by
//! a gradient-boosted meta model.

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod ml;
pub mod pipeline;
pub mod types;
pub mod ui;

pub use error::{PhishstackError, Result};
pub use pipeline::{PhishingDetector, PredictionResult, TrainedPipeline};
pub use types::{Feature, FeatureVector, Label};
