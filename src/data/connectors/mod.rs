mod csv;
mod types;
mod validator;

pub use csv::CsvConnector;
pub use types::{ColumnMap, DatasetSummary, SkippedRow, TrainingDataset};
pub use validator::DataValidator;
