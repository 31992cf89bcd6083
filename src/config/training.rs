use super::traits::{invalid, ConfigSection};
use crate::error::PhishstackError;
use crate::ml::training::StackingMethod;
use crate::types::LABEL_COLUMN;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_size: f64,
    pub random_state: u64,
    pub stacking: StackingMethod,
    /// Fit independent base models on the rayon pool.
    pub parallel_fit: bool,
    pub label_column: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            random_state: 42,
            stacking: StackingMethod::default(),
            parallel_fit: false,
            label_column: LABEL_COLUMN.to_string(),
        }
    }
}

impl ConfigSection for TrainingConfig {
    fn section_name() -> &'static str {
        "training"
    }

    fn validate(&self) -> Result<(), PhishstackError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(invalid(Self::section_name(), "test_size must be in (0, 1)"));
        }
        if let StackingMethod::CrossValidated { folds } = self.stacking {
            if folds < 2 {
                return Err(invalid(Self::section_name(), "cross validation needs at least 2 folds"));
            }
        }
        if self.label_column.trim().is_empty() {
            return Err(invalid(Self::section_name(), "label_column must not be empty"));
        }
        Ok(())
    }
}
