use super::traits::{invalid, ConfigSection};
use crate::error::PhishstackError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Trained pipeline written by `train` and read by the front-ends.
    pub artifact_path: PathBuf,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/phishing_model.json"),
        }
    }
}

impl ConfigSection for ServingConfig {
    fn section_name() -> &'static str {
        "serving"
    }

    fn validate(&self) -> Result<(), PhishstackError> {
        if self.artifact_path.as_os_str().is_empty() {
            return Err(invalid(Self::section_name(), "artifact_path must not be empty"));
        }
        Ok(())
    }
}
