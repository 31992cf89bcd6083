use crate::ui::state::AppState;

pub struct ModelSelector;

impl ModelSelector {
    pub fn show(ui: &mut egui::Ui, state: &mut AppState) {
        ui.horizontal(|ui| {
            let enabled = !state.is_running;
            if ui
                .add_enabled(enabled, egui::Button::new("Select Model File..."))
                .clicked()
            {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Model Files", &["json"])
                    .pick_file()
                {
                    match state.detector.load_model(&path) {
                        Ok(()) => {
                            state.status_message =
                                format!("Model loaded from {}", path.display());
                            state.model_path = Some(path);
                        }
                        Err(e) => {
                            state.status_message = format!("Error loading model: {}", e);
                        }
                    }
                }
            }
        });

        match (&state.model_path, state.detector.pipeline()) {
            (Some(path), Some(pipeline)) => {
                ui.label(format!(
                    "Model: {}",
                    path.file_name().unwrap_or_default().to_string_lossy()
                ));
                let meta = pipeline.metadata();
                ui.label(format!(
                    "Trained {} | {} | accuracy {:.2}%",
                    meta.created_at.format("%Y-%m-%d"),
                    meta.stacking,
                    meta.test_accuracy * 100.0
                ));
            }
            _ => {
                ui.label("No model loaded");
            }
        }
    }
}
