use crate::error::PhishstackError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), PhishstackError>;
}

pub(crate) fn invalid(section: &str, message: impl std::fmt::Display) -> PhishstackError {
    PhishstackError::Configuration(format!("[{}] {}", section, message))
}
