use super::{types::TrainingDataset, validator::DataValidator};
use crate::error::Result;
use polars::prelude::*;
use std::path::Path;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;
        Ok(df)
    }

    /// Load a labelled training file: six feature columns plus `label_column`.
    pub fn load_training<P: AsRef<Path>>(path: P, label_column: &str) -> Result<TrainingDataset> {
        let df = Self::load(&path)?;
        let file_path = path.as_ref().to_string_lossy().to_string();
        log::info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            file_path
        );

        let columns = DataValidator::resolve_columns(&df, label_column)?;
        let dataset = DataValidator::to_training_dataset(&df, &columns, &file_path)?;
        DataValidator::validate_minimum_rows(&dataset, 2)?;

        let s = &dataset.summary;
        log::info!(
            "Training data: {} rows kept, {} skipped, {} legitimate / {} phishing",
            s.rows_kept,
            s.rows_skipped(),
            s.class_counts[0],
            s.class_counts[1]
        );
        Ok(dataset)
    }
}
