use crate::types::Label;
use crate::ui::state::AppState;

pub struct ResultPanel;

impl ResultPanel {
    pub fn new() -> Self {
        Self
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &AppState) {
        ui.heading("Analysis Result");
        ui.separator();

        if state.is_running {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(&state.status_message);
            });
            return;
        }

        if let Some(error) = &state.last_error {
            ui.colored_label(egui::Color32::RED, error);
            return;
        }

        let Some(result) = &state.last_result else {
            ui.centered_and_justified(|ui| {
                ui.label("Enter a URL and click 'Analyze'.");
            });
            return;
        };

        ui.label(format!("URL: {}", result.url));
        ui.add_space(6.0);

        let (color, verdict) = match result.label {
            Label::Phishing => (egui::Color32::from_rgb(200, 40, 40), "PHISHING URL"),
            Label::Legitimate => (egui::Color32::from_rgb(40, 140, 60), "LEGITIMATE URL"),
        };
        ui.colored_label(color, egui::RichText::new(verdict).heading());

        ui.group(|ui| {
            egui::Grid::new("probabilities_grid").show(ui, |ui| {
                ui.label("Confidence:");
                ui.label(format!("{:.2}%", result.confidence() * 100.0));
                ui.end_row();
                ui.label("P(legitimate):");
                ui.label(format!("{:.2}%", result.p_legitimate * 100.0));
                ui.end_row();
                ui.label("P(phishing):");
                ui.label(format!("{:.2}%", result.p_phishing * 100.0));
                ui.end_row();
            });
        });

        if result.is_phishing() {
            ui.label("Avoid entering personal information on this site.");
        }

        ui.separator();

        ui.collapsing("Extracted features", |ui| {
            egui::Grid::new("features_grid").striped(true).show(ui, |ui| {
                for (name, value) in result.features.named_values() {
                    ui.label(name);
                    ui.label(value.to_string());
                    ui.end_row();
                }
            });
            for d in &result.degraded {
                ui.colored_label(egui::Color32::YELLOW, d.to_string());
            }
        });

        ui.collapsing("Base model probabilities", |ui| {
            egui::Grid::new("meta_features_grid").striped(true).show(ui, |ui| {
                for (kind, p) in result.meta_features.named_values() {
                    ui.label(kind.as_str());
                    ui.label(format!("{:.4}", p));
                    ui.end_row();
                }
            });
        });

        if !state.history.is_empty() {
            ui.separator();
            ui.collapsing("Recent analyses", |ui| {
                for entry in &state.history {
                    ui.label(format!(
                        "{}  {}  ({:.1}%)",
                        entry.label,
                        entry.url,
                        entry.confidence * 100.0
                    ));
                }
            });
        }
    }
}
