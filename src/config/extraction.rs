use super::traits::{invalid, ConfigSection};
use crate::error::PhishstackError;
use crate::features::SystemLookup;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// RDAP service queried as `{rdap_endpoint}/domain/{domain}`.
    pub rdap_endpoint: String,
    /// Bounds the RDAP request only. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rdap_endpoint: "https://rdap.org".to_string(),
            timeout_secs: None,
            user_agent: format!("phishstack/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExtractionConfig {
    pub fn build_lookup(&self) -> SystemLookup {
        SystemLookup::new(
            &self.rdap_endpoint,
            self.timeout_secs.map(Duration::from_secs),
            &self.user_agent,
        )
    }
}

impl ConfigSection for ExtractionConfig {
    fn section_name() -> &'static str {
        "extraction"
    }

    fn validate(&self) -> Result<(), PhishstackError> {
        let endpoint = self.rdap_endpoint.to_ascii_lowercase();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid(
                Self::section_name(),
                format!("rdap_endpoint must be an http(s) URL, got '{}'", self.rdap_endpoint),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(invalid(Self::section_name(), "timeout_secs must be positive"));
        }
        Ok(())
    }
}
