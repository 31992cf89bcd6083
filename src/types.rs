use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of lexical/WHOIS features fed to the base models.
pub const N_FEATURES: usize = 6;

/// Feature names in model column order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "time_domain_activation",
    "directory_length",
    "length_url",
    "qty_slash_url",
    "qty_dot_domain",
    "ttl_hostname",
];

/// Name of the binary target column in training data.
pub const LABEL_COLUMN: &str = "phishing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    TimeDomainActivation,
    DirectoryLength,
    LengthUrl,
    QtySlashUrl,
    QtyDotDomain,
    TtlHostname,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    pub fn index(&self) -> usize {
        match self {
            Self::TimeDomainActivation => 0,
            Self::DirectoryLength => 1,
            Self::LengthUrl => 2,
            Self::QtySlashUrl => 3,
            Self::QtyDotDomain => 4,
            Self::TtlHostname => 5,
        }
    }

    pub fn all() -> [Self; N_FEATURES] {
        [
            Self::TimeDomainActivation,
            Self::DirectoryLength,
            Self::LengthUrl,
            Self::QtySlashUrl,
            Self::QtyDotDomain,
            Self::TtlHostname,
        ]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six features extracted from one URL.
///
/// Every field is always populated; upstream failures map to 0 rather than
/// to an absent value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub time_domain_activation: i64,
    pub directory_length: i64,
    pub length_url: i64,
    pub qty_slash_url: i64,
    pub qty_dot_domain: i64,
    pub ttl_hostname: i64,
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> i64 {
        match feature {
            Feature::TimeDomainActivation => self.time_domain_activation,
            Feature::DirectoryLength => self.directory_length,
            Feature::LengthUrl => self.length_url,
            Feature::QtySlashUrl => self.qty_slash_url,
            Feature::QtyDotDomain => self.qty_dot_domain,
            Feature::TtlHostname => self.ttl_hostname,
        }
    }

    /// Values in `FEATURE_NAMES` order, as model input.
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        let mut row = [0.0; N_FEATURES];
        for feature in Feature::all() {
            row[feature.index()] = self.get(feature) as f64;
        }
        row
    }

    /// Named values in column order.
    pub fn named_values(&self) -> Vec<(&'static str, i64)> {
        Feature::all()
            .into_iter()
            .map(|f| (f.as_str(), self.get(f)))
            .collect()
    }
}

/// Binary class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Legitimate = 0,
    Phishing = 1,
}

impl Label {
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::Legitimate),
            1 => Some(Self::Phishing),
            _ => None,
        }
    }

    pub fn as_class(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legitimate => "legitimate",
            Self::Phishing => "phishing",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
