use crate::ml::matrix::FeatureMatrix;
use crate::types::Feature;
use serde::{Deserialize, Serialize};

/// Where each model input lives in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// Actual column names in `Feature::all()` order.
    pub features: Vec<(Feature, String)>,
    pub label: String,
}

/// A source row left out of the training set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    pub null_columns: Vec<String>,
}

/// What happened while turning a file into a training set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub file_path: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub skipped: Vec<SkippedRow>,
    /// `[legitimate, phishing]`.
    pub class_counts: [usize; 2],
}

impl DatasetSummary {
    pub fn rows_skipped(&self) -> usize {
        self.skipped.len()
    }
}

/// Feature matrix and labels ready for training.
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    pub x: FeatureMatrix,
    pub y: Vec<u8>,
    pub summary: DatasetSummary,
}
