use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhishstackError {
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Data schema error: {0}")]
    DataSchema(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model '{0}' has not been fitted")]
    NotFitted(&'static str),

    #[error("Shape mismatch: expected {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhishstackError>;
