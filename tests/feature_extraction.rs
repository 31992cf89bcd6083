mod common;

use common::{reference_extractor, FakeLookup, LEGITIMATE_URL, PHISHING_URL};
use phishstack::features::{normalize_url, FeatureExtractor};
use phishstack::types::{Feature, FEATURE_NAMES};
use std::sync::Arc;

#[test]
fn test_reference_phishing_url_features() {
    let features = reference_extractor().extract(PHISHING_URL);

    assert_eq!(features.time_domain_activation, 3);
    assert_eq!(features.length_url, PHISHING_URL.chars().count() as i64);
    assert_eq!(features.qty_slash_url, 4);
    assert!(features.qty_dot_domain >= 2);
    assert_eq!(features.directory_length, "/update/secure".len() as i64);
    assert_eq!(features.ttl_hostname, "paypa1-login.verify-account.co".len() as i64);
}

#[test]
fn test_reference_legitimate_url_features() {
    let features = reference_extractor().extract(LEGITIMATE_URL);

    assert!(features.time_domain_activation >= 7299);
    assert_eq!(features.length_url, 22);
    assert_eq!(features.qty_slash_url, 2);
    assert_eq!(features.qty_dot_domain, 2);
    assert_eq!(features.directory_length, 0);
}

#[test]
fn test_garbage_input_still_yields_all_features() {
    let extractor = FeatureExtractor::new(Arc::new(FakeLookup::new(None)));
    let report = extractor.extract_with_report("not a url");

    assert_eq!(report.features.named_values().len(), FEATURE_NAMES.len());
    assert_eq!(report.features.get(Feature::TimeDomainActivation), 0);
    assert_eq!(report.features.length_url, 9);
    assert_eq!(report.features.qty_slash_url, 0);
    assert!(report.is_degraded());
}

#[test]
fn test_normalized_length_counts_prepended_scheme() {
    let extractor = FeatureExtractor::new(Arc::new(FakeLookup::new(Some(100))));
    let url = normalize_url("example.com/login");
    assert_eq!(url, "https://example.com/login");

    let features = extractor.extract(&url);
    assert_eq!(features.length_url, url.chars().count() as i64);
    assert_eq!(features.qty_slash_url, 3);
    assert_eq!(features.time_domain_activation, 100);
}

#[test]
fn test_failed_lookup_defaults_to_zero_age() {
    let extractor = FeatureExtractor::new(Arc::new(FakeLookup::new(None)));
    let report = extractor.extract_with_report("https://unknown-host.example/path");

    assert_eq!(report.features.time_domain_activation, 0);
    assert!(report
        .degraded
        .iter()
        .any(|d| d.feature == Feature::TimeDomainActivation));
}
