use crate::config::AppConfig;
use crate::pipeline::{PhishingDetector, PredictionResult};
use std::path::PathBuf;

/// Central application state for the UI
pub struct AppState {
    pub config: AppConfig,
    pub detector: PhishingDetector,

    // Model
    pub model_path: Option<PathBuf>,

    // Input
    pub url_input: String,

    // Execution State
    pub is_running: bool,
    pub analyze_requested: bool,
    pub status_message: String,

    // Results
    pub last_result: Option<PredictionResult>,
    pub last_error: Option<String>,
    pub history: Vec<HistoryEntry>,
}

impl AppState {
    pub fn new(config: AppConfig, detector: PhishingDetector) -> Self {
        let status_message = if detector.is_loaded() {
            "Ready".to_string()
        } else {
            "No model loaded. Choose a model file to start.".to_string()
        };
        Self {
            config,
            detector,
            model_path: None,
            url_input: String::new(),
            is_running: false,
            analyze_requested: false,
            status_message,
            last_result: None,
            last_error: None,
            history: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.url_input.clear();
        self.last_result = None;
        self.last_error = None;
    }

    pub fn record(&mut self, result: PredictionResult) {
        self.history.insert(
            0,
            HistoryEntry {
                url: result.url.clone(),
                label: result.label.to_string(),
                confidence: result.confidence(),
            },
        );
        self.history.truncate(MAX_HISTORY);
        self.last_error = None;
        self.last_result = Some(result);
    }
}

const MAX_HISTORY: usize = 20;

/// One line of the recent-analyses list
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub url: String,
    pub label: String,
    pub confidence: f64,
}
