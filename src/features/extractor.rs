use super::lookup::{LookupError, NetworkLookup};
use super::url_parts::split_url;
use crate::types::{Feature, FeatureVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A feature that fell back to its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtractionDegraded {
    pub feature: Feature,
    pub reason: String,
}

impl fmt::Display for FeatureExtractionDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} defaulted: {}", self.feature, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub features: FeatureVector,
    pub degraded: Vec<FeatureExtractionDegraded>,
}

impl ExtractionReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Whole days from `created` to `now`; future dates count as 0.
pub fn domain_age_days(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created).num_days().max(0)
}

/// Turns a raw URL into the six model features.
///
/// Extraction never fails. Lookups that go wrong leave a default in place
/// and a [`FeatureExtractionDegraded`] record in the report.
#[derive(Clone)]
pub struct FeatureExtractor {
    lookup: Arc<dyn NetworkLookup>,
}

impl FeatureExtractor {
    pub fn new(lookup: Arc<dyn NetworkLookup>) -> Self {
        Self { lookup }
    }

    pub fn extract(&self, url: &str) -> FeatureVector {
        self.extract_with_report(url).features
    }

    pub fn extract_with_report(&self, url: &str) -> ExtractionReport {
        self.extract_at(url, Utc::now())
    }

    /// Extraction with domain age measured against `now`.
    pub fn extract_at(&self, url: &str, now: DateTime<Utc>) -> ExtractionReport {
        let parts = split_url(url);
        let host = parts.host;
        let host_len = host.chars().count() as i64;
        let mut degraded = Vec::new();

        let time_domain_activation = match self.domain_age(host, now) {
            Ok(days) => days,
            Err(e) => {
                degraded.push(FeatureExtractionDegraded {
                    feature: Feature::TimeDomainActivation,
                    reason: e.to_string(),
                });
                0
            }
        };

        // The resolution result is not used: ttl_hostname is the host length
        // whether or not the name resolves.
        if let Err(e) = self.lookup.resolve_host(host) {
            degraded.push(FeatureExtractionDegraded {
                feature: Feature::TtlHostname,
                reason: e.to_string(),
            });
        }

        for d in &degraded {
            log::warn!("{}: {}", url, d);
        }

        let features = FeatureVector {
            time_domain_activation,
            directory_length: parts.path.chars().count() as i64,
            length_url: url.chars().count() as i64,
            qty_slash_url: url.matches('/').count() as i64,
            qty_dot_domain: host.matches('.').count() as i64,
            ttl_hostname: host_len,
        };
        log::debug!("extracted {:?} from {}", features, url);

        ExtractionReport { features, degraded }
    }

    fn domain_age(&self, host: &str, now: DateTime<Utc>) -> Result<i64, LookupError> {
        if host.is_empty() {
            return Err(LookupError::EmptyHost);
        }
        let created = self.lookup.creation_date(host)?;
        Ok(domain_age_days(created, now))
    }
}
