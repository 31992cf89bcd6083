use crate::ui::state::AppState;
use crate::ui::widgets::ModelSelector;

pub struct InputPanel;

impl InputPanel {
    pub fn new() -> Self {
        Self
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &mut AppState) {
        ui.collapsing("Model", |ui| {
            ModelSelector::show(ui, state);
        });

        ui.separator();

        ui.label("URL to analyze:");
        ui.horizontal(|ui| {
            let entry = ui.add(
                egui::TextEdit::singleline(&mut state.url_input)
                    .hint_text("https://example.com")
                    .desired_width(480.0),
            );
            let submitted =
                entry.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let can_run = Self::validate_input(state).is_ok() && !state.is_running;
            let analyze = ui.add_enabled(can_run, egui::Button::new("Analyze"));
            if (analyze.clicked() || submitted) && can_run {
                state.analyze_requested = true;
            }

            if ui
                .add_enabled(!state.is_running, egui::Button::new("Clear"))
                .clicked()
            {
                state.clear();
                entry.request_focus();
            }
        });

        if let Err(error) = Self::validate_input(state) {
            if !state.url_input.is_empty() {
                ui.colored_label(egui::Color32::RED, error);
            }
        }
    }

    fn validate_input(state: &AppState) -> Result<(), String> {
        if !state.detector.is_loaded() {
            return Err("No model loaded".to_string());
        }
        if state.url_input.trim().is_empty() {
            return Err("Enter a URL".to_string());
        }
        Ok(())
    }
}
