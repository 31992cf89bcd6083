mod common;

use common::{fast_config, reference_extractor, synthetic_dataset, temp_path, PHISHING_URL};
use phishstack::ml::training::LogProgress;
use phishstack::pipeline::{train_pipeline, PhishingDetector, TrainedPipeline};
use phishstack::PhishstackError;
use std::sync::Arc;

#[test]
fn test_saved_pipeline_predicts_identically() {
    let dataset = synthetic_dataset(400, 21);
    let (pipeline, _) = train_pipeline(&dataset, &fast_config(), &mut LogProgress).unwrap();

    let path = temp_path("roundtrip", "json");
    pipeline.save(&path).unwrap();
    let reloaded = TrainedPipeline::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(reloaded.metadata(), pipeline.metadata());
    assert_eq!(reloaded.base_kinds(), pipeline.base_kinds());
    for row in dataset.x.rows() {
        let before = pipeline.classifier().predict_row(row).unwrap();
        let after = reloaded.classifier().predict_row(row).unwrap();
        assert!((before.p_phishing - after.p_phishing).abs() <= 1e-6);
        assert_eq!(before.label, after.label);
        for (a, b) in before
            .meta_features
            .values()
            .iter()
            .zip(after.meta_features.values())
        {
            assert!((a - b).abs() <= 1e-6);
        }
    }
}

#[test]
fn test_repeated_predictions_agree() {
    let dataset = synthetic_dataset(300, 8);
    let (pipeline, _) = train_pipeline(&dataset, &fast_config(), &mut LogProgress).unwrap();
    let detector = PhishingDetector::from_pipeline(Arc::new(pipeline), reference_extractor());

    let first = detector.predict(PHISHING_URL).unwrap();
    let agreeing = (0..100)
        .filter(|_| detector.predict(PHISHING_URL).unwrap().label == first.label)
        .count();
    assert!(agreeing >= 99);
}

#[test]
fn test_corrupt_artifact_is_rejected() {
    let path = temp_path("corrupt", "json");
    std::fs::write(&path, "{\"format\": 1, \"feature_names\": []}").unwrap();

    assert!(TrainedPipeline::load(&path).is_err());
    let err = PhishingDetector::load_with(&path, reference_extractor()).err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, Some(PhishstackError::ModelNotLoaded(_))));
}

#[test]
fn test_artifact_with_reordered_base_models_is_rejected() {
    let dataset = synthetic_dataset(300, 13);
    let (pipeline, _) = train_pipeline(&dataset, &fast_config(), &mut LogProgress).unwrap();

    let mut doc = serde_json::to_value(&pipeline).unwrap();
    let models = doc["classifier"]["base"]["models"].as_array_mut().unwrap();
    assert_eq!(models.len(), 4);
    models.swap(0, 3);

    let path = temp_path("reordered", "json");
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
    let direct = TrainedPipeline::load(&path);
    let served = PhishingDetector::load_with(&path, reference_extractor()).err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(direct, Err(PhishstackError::DataSchema(_))));
    assert!(matches!(served, Some(PhishstackError::ModelNotLoaded(_))));
}

#[test]
fn test_training_rejects_reordered_base_models() {
    let dataset = synthetic_dataset(200, 17);
    let mut config = fast_config();
    config.models.base.swap(1, 3);

    let result = train_pipeline(&dataset, &config, &mut LogProgress);
    assert!(matches!(result, Err(PhishstackError::Configuration(_))));
}
