//! Persisted artifact, the serving detector built on it, and the training
//! entry points that produce it.

pub mod artifact;
pub mod detector;
pub mod training;

pub use artifact::{ArtifactMetadata, TrainedPipeline, ARTIFACT_FORMAT};
pub use detector::{PhishingDetector, PredictionResult};
pub use training::{train_from_csv, train_pipeline};
