use eframe::NativeOptions;
use phishstack::ui::PhishstackApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("Phishstack - URL Phishing Detector"),
        ..Default::default()
    };

    eframe::run_native(
        "Phishstack",
        native_options,
        Box::new(|cc| Ok(Box::new(PhishstackApp::new(cc)))),
    )
}
