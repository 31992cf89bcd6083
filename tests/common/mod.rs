#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use phishstack::config::AppConfig;
use phishstack::data::{DatasetSummary, TrainingDataset};
use phishstack::features::{FeatureExtractor, LookupError, NetworkLookup};
use phishstack::ml::models::{CatBoostParams, ForestParams, LightGbmParams, LogisticParams};
use phishstack::ml::stacking::BaseModelSpec;
use phishstack::ml::FeatureMatrix;
use phishstack::types::{FEATURE_NAMES, LABEL_COLUMN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PHISHING_URL: &str = "http://paypa1-login.verify-account.co/update/secure?id=123";
pub const LEGITIMATE_URL: &str = "https://www.google.com";

/// One synthetic row: six features in column order plus the label.
pub type Row = ([f64; 6], u8);

/// Rows shaped like the reference data: phishing domains are days old with
/// long paths, legitimate ones are years old with short URLs.
pub fn synthetic_rows(n: usize, seed: u64) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let phishing = i % 5 < 2;
            let features = if phishing {
                [
                    rng.gen_range(0..=60) as f64,
                    rng.gen_range(5..=60) as f64,
                    rng.gen_range(35..=150) as f64,
                    rng.gen_range(3..=9) as f64,
                    rng.gen_range(1..=5) as f64,
                    rng.gen_range(10..=40) as f64,
                ]
            } else {
                [
                    rng.gen_range(1000..=9000) as f64,
                    rng.gen_range(0..=20) as f64,
                    rng.gen_range(12..=60) as f64,
                    rng.gen_range(2..=5) as f64,
                    rng.gen_range(1..=3) as f64,
                    rng.gen_range(8..=22) as f64,
                ]
            };
            (features, u8::from(phishing))
        })
        .collect()
}

pub fn synthetic_dataset(n: usize, seed: u64) -> TrainingDataset {
    let rows = synthetic_rows(n, seed);
    let features: Vec<[f64; 6]> = rows.iter().map(|(f, _)| *f).collect();
    let y: Vec<u8> = rows.iter().map(|(_, l)| *l).collect();
    let positives = y.iter().filter(|&&l| l == 1).count();
    TrainingDataset {
        x: FeatureMatrix::from_rows(6, &features).unwrap(),
        summary: DatasetSummary {
            file_path: "<synthetic>".to_string(),
            rows_read: n,
            rows_kept: n,
            skipped: Vec::new(),
            class_counts: [n - positives, positives],
        },
        y,
    }
}

pub fn write_csv(path: &Path, rows: &[Row]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "{},{}", FEATURE_NAMES.join(","), LABEL_COLUMN).unwrap();
    for (features, label) in rows {
        let cells: Vec<String> = features.iter().map(|v| format!("{}", *v as i64)).collect();
        writeln!(file, "{},{}", cells.join(","), label).unwrap();
    }
}

pub fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "phishstack_it_{}_{}.{}",
        name,
        std::process::id(),
        ext
    ))
}

/// Small models so the suite runs in seconds.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.models.base = vec![
        BaseModelSpec::CatBoost(CatBoostParams {
            iterations: 60,
            depth: 4,
            random_seed: Some(7),
            ..Default::default()
        }),
        BaseModelSpec::RandomForest(ForestParams {
            n_estimators: 25,
            ..Default::default()
        }),
        BaseModelSpec::LightGbm(LightGbmParams {
            n_estimators: 40,
            ..Default::default()
        }),
        BaseModelSpec::Logistic(LogisticParams::default()),
    ];
    config.models.meta.n_estimators = 100;
    config
}

/// Answers domain age from a fixed table; every host resolves.
pub struct FakeLookup {
    ages: HashMap<String, i64>,
    default_age: Option<i64>,
    now: DateTime<Utc>,
}

impl FakeLookup {
    pub fn new(default_age: Option<i64>) -> Self {
        Self {
            ages: HashMap::new(),
            default_age,
            now: Utc::now(),
        }
    }

    pub fn with_age(mut self, host: &str, days: i64) -> Self {
        self.ages.insert(host.to_string(), days);
        self
    }
}

impl NetworkLookup for FakeLookup {
    fn creation_date(&self, host: &str) -> Result<DateTime<Utc>, LookupError> {
        self.ages
            .get(host)
            .copied()
            .or(self.default_age)
            .map(|days| self.now - Duration::days(days))
            .ok_or_else(|| LookupError::NoRegistrationDate(host.to_string()))
    }

    fn resolve_host(&self, _host: &str) -> Result<Vec<IpAddr>, LookupError> {
        Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))])
    }
}

/// Extractor knowing the two reference domains.
pub fn reference_extractor() -> FeatureExtractor {
    let lookup = FakeLookup::new(None)
        .with_age("paypa1-login.verify-account.co", 3)
        .with_age("www.google.com", 20 * 365);
    FeatureExtractor::new(Arc::new(lookup))
}
