use crate::pipeline::{PhishingDetector, PredictionResult};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Progress update from the analysis thread
#[derive(Clone, Debug)]
pub struct ProgressUpdate {
    pub url: String,
    pub status: String,
}

/// Result from one analysis run
pub type AnalysisResult = Result<PredictionResult, String>;

/// Runs one URL analysis off the UI thread.
pub struct AnalysisRunner {
    handle: Option<JoinHandle<AnalysisResult>>,
    progress_rx: Option<Receiver<ProgressUpdate>>,
}

impl AnalysisRunner {
    /// Start analysis in background thread
    pub fn start(detector: PhishingDetector, url: String) -> std::io::Result<Self> {
        let (progress_tx, progress_rx) = channel();

        let handle = thread::Builder::new()
            .name("phishstack-analysis".to_string())
            .spawn(move || Self::run_analysis(detector, url, progress_tx))?;

        Ok(Self {
            handle: Some(handle),
            progress_rx: Some(progress_rx),
        })
    }

    /// Poll for progress updates (non-blocking)
    pub fn poll_progress(&mut self) -> Option<ProgressUpdate> {
        self.progress_rx.as_ref().and_then(|rx| rx.try_recv().ok())
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Check if the analysis is complete and get the result
    pub fn try_get_result(&mut self) -> Option<AnalysisResult> {
        let handle = self.handle.take()?;
        if handle.is_finished() {
            match handle.join() {
                Ok(result) => Some(result),
                Err(_) => Some(Err("Prediction error: analysis thread panicked".to_string())),
            }
        } else {
            // Not finished yet, put handle back
            self.handle = Some(handle);
            None
        }
    }

    fn run_analysis(
        detector: PhishingDetector,
        url: String,
        progress_tx: Sender<ProgressUpdate>,
    ) -> AnalysisResult {
        let _ = progress_tx.send(ProgressUpdate {
            url: url.clone(),
            status: format!("Analyzing {}...", url),
        });

        let result = detector.analyze(&url).map_err(|e| e.to_string());

        let status = match &result {
            Ok(r) => format!("Done: {} ({:.1}% confidence)", r.label, r.confidence() * 100.0),
            Err(e) => format!("Error: {}", e),
        };
        let _ = progress_tx.send(ProgressUpdate { url, status });
        result
    }
}
