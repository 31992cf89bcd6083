use super::artifact::TrainedPipeline;
use crate::config::AppConfig;
use crate::data::{CsvConnector, TrainingDataset};
use crate::error::Result;
use crate::ml::training::{EvaluationReport, TrainingOrchestrator, TrainingProgress};
use std::path::Path;

/// Trains a full pipeline on an in-memory dataset.
pub fn train_pipeline(
    dataset: &TrainingDataset,
    config: &AppConfig,
    progress: &mut dyn TrainingProgress,
) -> Result<(TrainedPipeline, EvaluationReport)> {
    config.validate()?;
    let mut orchestrator = TrainingOrchestrator::new(config.training_plan());
    let outcome = orchestrator.run(&dataset.x, &dataset.y, progress)?;
    let pipeline = TrainedPipeline::new(outcome.classifier, &outcome.report)?;
    Ok((pipeline, outcome.report))
}

/// Loads `csv_path`, trains, and returns the pipeline with its report.
pub fn train_from_csv<P: AsRef<Path>>(
    csv_path: P,
    config: &AppConfig,
    progress: &mut dyn TrainingProgress,
) -> Result<(TrainedPipeline, EvaluationReport, TrainingDataset)> {
    let dataset = CsvConnector::load_training(csv_path, &config.training.label_column)?;
    let (pipeline, report) = train_pipeline(&dataset, config, progress)?;
    Ok((pipeline, report, dataset))
}
