use super::traits::ConfigSection;
use crate::error::PhishstackError;
use crate::ml::models::XgbParams;
use crate::ml::stacking::{require_full_stack, validate_stack, BaseModelSpec};
use serde::{Deserialize, Serialize};

/// Ordered base models and the meta model.
///
/// The order of `base` is the column order of the meta-feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub base: Vec<BaseModelSpec>,
    pub meta: XgbParams,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            base: BaseModelSpec::default_stack(),
            meta: XgbParams::default(),
        }
    }
}

impl ConfigSection for ModelsConfig {
    fn section_name() -> &'static str {
        "models"
    }

    fn validate(&self) -> Result<(), PhishstackError> {
        validate_stack(&self.base)?;
        let kinds: Vec<_> = self.base.iter().map(|s| s.kind()).collect();
        require_full_stack(&kinds)?;
        self.meta.to_boosting().validate()
    }
}
