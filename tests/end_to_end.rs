mod common;

use chrono::{DateTime, Utc};
use common::{
    fast_config, reference_extractor, synthetic_dataset, synthetic_rows, temp_path, write_csv,
    LEGITIMATE_URL, PHISHING_URL,
};
use phishstack::features::{FeatureExtractor, LookupError, NetworkLookup};
use phishstack::ml::training::LogProgress;
use phishstack::pipeline::{train_from_csv, train_pipeline, PhishingDetector};
use phishstack::types::Label;
use phishstack::PhishstackError;
use std::net::IpAddr;
use std::sync::Arc;

/// A lookup backend with a bug in it.
struct FaultyLookup;

impl NetworkLookup for FaultyLookup {
    fn creation_date(&self, host: &str) -> Result<DateTime<Utc>, LookupError> {
        panic!("lookup backend crashed on {}", host);
    }

    fn resolve_host(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
        Ok(Vec::new())
    }
}

/// Trains from a CSV on disk and returns a detector loaded from the saved
/// artifact, the way the CLI does.
fn trained_detector(name: &str) -> PhishingDetector {
    let csv = temp_path(name, "csv");
    let model = temp_path(name, "json");
    write_csv(&csv, &synthetic_rows(600, 42));

    let config = fast_config();
    let (pipeline, report, dataset) = train_from_csv(&csv, &config, &mut LogProgress).unwrap();
    println!("{}", report);
    assert_eq!(dataset.summary.rows_kept, 600);
    pipeline.save(&model).unwrap();

    let detector = PhishingDetector::load_with(&model, reference_extractor()).unwrap();
    std::fs::remove_file(&csv).ok();
    std::fs::remove_file(&model).ok();
    detector
}

#[test]
fn test_reference_urls_are_classified() {
    let detector = trained_detector("reference");

    let phishing = detector.predict(PHISHING_URL).unwrap();
    assert_eq!(phishing.features.time_domain_activation, 3);
    assert!(phishing.features.qty_dot_domain >= 2);
    assert_eq!(phishing.label, Label::Phishing);
    assert!(phishing.p_phishing > 0.5);

    let legitimate = detector.predict(LEGITIMATE_URL).unwrap();
    assert_eq!(legitimate.label, Label::Legitimate);
    assert!(legitimate.p_legitimate > 0.5);
    assert_eq!(legitimate.meta_features.len(), 4);
}

#[test]
fn test_garbage_input_is_scored_not_rejected() {
    let detector = trained_detector("garbage");

    let result = detector.analyze("not a url").unwrap();
    assert_eq!(result.url, "https://not a url");
    assert!((result.p_legitimate + result.p_phishing - 1.0).abs() < 1e-9);
    assert!(!result.degraded.is_empty());
}

#[test]
fn test_predict_without_model_fails() {
    let extractor = FeatureExtractor::new(Arc::new(common::FakeLookup::new(Some(10))));
    let detector = PhishingDetector::unloaded(extractor);

    assert!(!detector.is_loaded());
    assert!(matches!(
        detector.predict(LEGITIMATE_URL),
        Err(PhishstackError::ModelNotLoaded(_))
    ));
}

#[test]
fn test_missing_artifact_is_model_not_loaded() {
    let path = temp_path("does_not_exist", "json");
    let result = PhishingDetector::load_with(&path, reference_extractor());
    assert!(matches!(result, Err(PhishstackError::ModelNotLoaded(_))));
}

#[test]
fn test_csv_without_label_column_is_schema_error() {
    let csv = temp_path("no_label", "csv");
    std::fs::write(
        &csv,
        "time_domain_activation,directory_length,length_url,qty_slash_url,qty_dot_domain,ttl_hostname\n1,2,3,4,5,6\n",
    )
    .unwrap();

    let result = train_from_csv(&csv, &fast_config(), &mut LogProgress);
    std::fs::remove_file(&csv).ok();
    assert!(matches!(result, Err(PhishstackError::DataSchema(_))));
}

#[test]
fn test_fault_during_extraction_is_prediction_error() {
    let dataset = synthetic_dataset(300, 4);
    let (pipeline, _) = train_pipeline(&dataset, &fast_config(), &mut LogProgress).unwrap();
    let detector = PhishingDetector::from_pipeline(
        Arc::new(pipeline),
        FeatureExtractor::new(Arc::new(FaultyLookup)),
    );

    assert!(matches!(
        detector.predict(LEGITIMATE_URL),
        Err(PhishstackError::Prediction(_))
    ));
    assert!(matches!(
        detector.analyze("www.google.com"),
        Err(PhishstackError::Prediction(_))
    ));
}
