use super::panels::{InputPanel, ResultPanel};
use super::services::AnalysisRunner;
use super::state::AppState;
use crate::config::ConfigManager;
use crate::features::FeatureExtractor;
use crate::pipeline::PhishingDetector;
use std::path::PathBuf;
use std::sync::Arc;

pub struct PhishstackApp {
    state: AppState,
    runner: Option<AnalysisRunner>,
    input_panel: InputPanel,
    result_panel: ResultPanel,
}

impl PhishstackApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let manager = ConfigManager::new();
        if let Err(e) = manager.load_startup(None) {
            log::warn!("Falling back to default configuration: {}", e);
        }
        let config = manager.get().unwrap_or_default();

        let extractor = FeatureExtractor::new(Arc::new(config.extraction.build_lookup()));
        let mut detector = PhishingDetector::unloaded(extractor);
        let artifact = PathBuf::from(&config.serving.artifact_path);
        let loaded = match detector.load_model(&artifact) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        };

        let mut state = AppState::new(config, detector);
        if loaded {
            state.model_path = Some(artifact);
        }

        Self {
            state,
            runner: None,
            input_panel: InputPanel::new(),
            result_panel: ResultPanel::new(),
        }
    }

    fn start_analysis(&mut self) {
        self.state.analyze_requested = false;
        let url = self.state.url_input.trim().to_string();
        match AnalysisRunner::start(self.state.detector.clone(), url) {
            Ok(runner) => {
                self.runner = Some(runner);
                self.state.is_running = true;
                self.state.last_error = None;
                self.state.status_message = "Analyzing...".to_string();
            }
            Err(e) => {
                self.state.last_error = Some(format!("Failed to start analysis: {}", e));
            }
        }
    }

    fn poll_runner(&mut self) {
        let Some(runner) = self.runner.as_mut() else {
            return;
        };

        while let Some(update) = runner.poll_progress() {
            self.state.status_message = update.status;
        }

        if let Some(result) = runner.try_get_result() {
            while let Some(update) = runner.poll_progress() {
                self.state.status_message = update.status;
            }
            self.runner = None;
            self.state.is_running = false;
            match result {
                Ok(prediction) => self.state.record(prediction),
                Err(e) => {
                    self.state.last_result = None;
                    self.state.last_error = Some(e);
                }
            }
        }
    }
}

impl eframe::App for PhishstackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_runner();
        if self.state.analyze_requested && self.runner.is_none() {
            self.start_analysis();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Phishstack - URL Phishing Detector");
            });
            ui.separator();
            self.input_panel.show(ui, &mut self.state);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.state.status_message);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.result_panel.show(ui, &self.state);
            });
        });

        if self.state.is_running {
            ctx.request_repaint();
        }
    }
}
