use super::types::{ColumnMap, DatasetSummary, SkippedRow, TrainingDataset};
use crate::error::{PhishstackError, Result};
use crate::ml::matrix::FeatureMatrix;
use crate::types::{Feature, N_FEATURES};
use polars::prelude::*;

pub struct DataValidator;

impl DataValidator {
    /// Resolves the six feature columns and the label column, matching names
    /// exactly first and case-insensitively second.
    pub fn resolve_columns(df: &DataFrame, label_column: &str) -> Result<ColumnMap> {
        let label = Self::find_column(df, label_column).ok_or_else(|| {
            PhishstackError::DataSchema(format!("Missing label column: {}", label_column))
        })?;

        let mut features = Vec::with_capacity(N_FEATURES);
        let mut missing = Vec::new();
        for feature in Feature::all() {
            match Self::find_column(df, feature.as_str()) {
                Some(name) => features.push((feature, name)),
                None => missing.push(feature.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(PhishstackError::DataSchema(format!(
                "Missing feature columns: {}",
                missing.join(", ")
            )));
        }

        let map = ColumnMap { features, label };
        Self::validate_numeric(df, &map)?;
        Ok(map)
    }

    fn find_column(df: &DataFrame, wanted: &str) -> Option<String> {
        let columns = df.get_column_names();
        columns
            .iter()
            .find(|col| col.as_str() == wanted)
            .or_else(|| columns.iter().find(|col| col.as_str().eq_ignore_ascii_case(wanted)))
            .map(|col| col.to_string())
    }

    fn validate_numeric(df: &DataFrame, map: &ColumnMap) -> Result<()> {
        let names = map
            .features
            .iter()
            .map(|(_, name)| name)
            .chain(std::iter::once(&map.label));
        for name in names {
            let column = df.column(name)?;
            let numeric = matches!(
                column.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::Int16
                    | DataType::Int8
                    | DataType::UInt64
                    | DataType::UInt32
                    | DataType::UInt16
                    | DataType::UInt8
                    | DataType::Boolean
                    | DataType::Null
            );
            if !numeric {
                return Err(PhishstackError::DataSchema(format!(
                    "Column '{}' must be numeric, found {:?}",
                    name,
                    column.dtype()
                )));
            }
        }
        Ok(())
    }

    /// Builds the training set, leaving out rows with a null or non-finite
    /// feature or label.
    ///
    /// Labels must be exactly 0 or 1.
    pub fn to_training_dataset(
        df: &DataFrame,
        map: &ColumnMap,
        file_path: &str,
    ) -> Result<TrainingDataset> {
        let mut casted = Vec::with_capacity(map.features.len());
        for (_, name) in &map.features {
            casted.push((name.as_str(), df.column(name)?.cast(&DataType::Float64)?));
        }
        let mut feature_cols = Vec::with_capacity(casted.len());
        for (name, column) in &casted {
            feature_cols.push((*name, column.f64()?));
        }
        let label_col = df.column(&map.label)?.cast(&DataType::Float64)?;
        let labels = label_col.f64()?;

        let mut x = FeatureMatrix::new(N_FEATURES);
        let mut y = Vec::with_capacity(df.height());
        let mut skipped = Vec::new();
        let mut class_counts = [0usize; 2];
        let mut row = [0.0; N_FEATURES];

        for i in 0..df.height() {
            let mut null_columns = Vec::new();
            for (j, (name, column)) in feature_cols.iter().enumerate() {
                match column.get(i) {
                    Some(v) if v.is_finite() => row[j] = v,
                    _ => null_columns.push(name.to_string()),
                }
            }
            let label = labels.get(i).filter(|v| v.is_finite());
            if label.is_none() {
                null_columns.push(map.label.clone());
            }
            if !null_columns.is_empty() {
                skipped.push(SkippedRow { row: i, null_columns });
                continue;
            }

            let label = match label {
                Some(v) if v == 0.0 => 0u8,
                Some(v) if v == 1.0 => 1u8,
                other => {
                    return Err(PhishstackError::DataSchema(format!(
                        "Label column '{}' must be binary (0/1), found {:?} at row {}",
                        map.label, other, i
                    )))
                }
            };
            x.push_row(&row)?;
            y.push(label);
            class_counts[usize::from(label)] += 1;
        }

        if !skipped.is_empty() {
            let rows: Vec<usize> = skipped.iter().map(|s| s.row).collect();
            log::warn!(
                "Skipping {} rows with missing or non-finite values: {:?}",
                skipped.len(),
                rows
            );
        }

        let summary = DatasetSummary {
            file_path: file_path.to_string(),
            rows_read: df.height(),
            rows_kept: y.len(),
            skipped,
            class_counts,
        };
        Ok(TrainingDataset { x, y, summary })
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(dataset: &TrainingDataset, min_rows: usize) -> Result<()> {
        if dataset.y.len() < min_rows {
            return Err(PhishstackError::DataSchema(format!(
                "Insufficient data: {} usable rows, minimum {} required",
                dataset.y.len(),
                min_rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn frame() -> DataFrame {
        frame_with_labels(&[1, 0, 1, 1])
    }

    fn frame_with_labels(labels: &[i64]) -> DataFrame {
        df! {
            "time_domain_activation" => &[Some(10i64), Some(4000), None, Some(7)],
            "directory_length" => &[12i64, 0, 3, 20],
            "length_url" => &[60i64, 22, 30, 71],
            "qty_slash_url" => &[4i64, 2, 3, 5],
            "qty_dot_domain" => &[2i64, 2, 1, 3],
            "ttl_hostname" => &[30i64, 14, 12, 25],
            "phishing" => labels,
        }
        .unwrap()
    }

    #[test]
    fn test_resolve_columns() {
        let map = DataValidator::resolve_columns(&frame(), "phishing").unwrap();
        assert_eq!(map.label, "phishing");
        assert_eq!(map.features.len(), N_FEATURES);
        assert_eq!(map.features[0].1, "time_domain_activation");
    }

    #[test]
    fn test_missing_label_column() {
        let df = frame().drop("phishing").unwrap();
        let err = DataValidator::resolve_columns(&df, "phishing");
        assert!(matches!(err, Err(PhishstackError::DataSchema(_))));
    }

    #[test]
    fn test_missing_feature_column() {
        let df = frame().drop("ttl_hostname").unwrap();
        let err = DataValidator::resolve_columns(&df, "phishing").unwrap_err();
        assert!(err.to_string().contains("ttl_hostname"));
    }

    #[test]
    fn test_case_insensitive_label() {
        let mut df = frame();
        df.rename("phishing", "Phishing".into()).unwrap();
        let map = DataValidator::resolve_columns(&df, "phishing").unwrap();
        assert_eq!(map.label, "Phishing");
    }

    #[test]
    fn test_rows_with_nulls_are_skipped() {
        let df = frame();
        let map = DataValidator::resolve_columns(&df, "phishing").unwrap();
        let ds = DataValidator::to_training_dataset(&df, &map, "mem.csv").unwrap();

        assert_eq!(ds.summary.rows_read, 4);
        assert_eq!(ds.summary.rows_kept, 3);
        assert_eq!(ds.summary.skipped[0].row, 2);
        assert_eq!(ds.summary.skipped[0].null_columns, vec!["time_domain_activation"]);
        assert_eq!(ds.summary.class_counts, [1, 2]);
        assert_eq!(ds.x.row(1), &[4000.0, 0.0, 22.0, 2.0, 2.0, 14.0]);
        assert_eq!(ds.y, vec![1, 0, 1]);
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let df = frame_with_labels(&[2, 0, 1, 1]);
        let map = DataValidator::resolve_columns(&df, "phishing").unwrap();
        let err = DataValidator::to_training_dataset(&df, &map, "mem.csv");
        assert!(matches!(err, Err(PhishstackError::DataSchema(_))));
    }

    #[test]
    fn test_nan_label_row_is_skipped() {
        let df = df! {
            "time_domain_activation" => &[10i64, 4000, 5, 7],
            "directory_length" => &[12i64, 0, 3, 20],
            "length_url" => &[60i64, 22, 30, 71],
            "qty_slash_url" => &[4i64, 2, 3, 5],
            "qty_dot_domain" => &[2i64, 2, 1, 3],
            "ttl_hostname" => &[30i64, 14, 12, 25],
            "phishing" => &[1.0f64, 0.0, f64::NAN, 1.0],
        }
        .unwrap();
        let map = DataValidator::resolve_columns(&df, "phishing").unwrap();
        let ds = DataValidator::to_training_dataset(&df, &map, "mem.csv").unwrap();

        assert_eq!(ds.summary.rows_kept, 3);
        assert_eq!(ds.summary.skipped.len(), 1);
        assert_eq!(ds.summary.skipped[0].row, 2);
        assert_eq!(ds.summary.skipped[0].null_columns, vec!["phishing"]);
        assert_eq!(ds.y, vec![1, 0, 1]);
    }
}
