use eframe::egui;
use tide_tales::app::TideTalesApp;
use tide_tales::config::AppConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to read config, using defaults: {e:#}");
        let mut config = AppConfig::default();
        config.apply_env(std::env::var(tide_tales::config::API_KEY_ENV).ok());
        config
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tide Tales – Climate Stories",
        options,
        Box::new(|_cc| Ok(Box::new(TideTalesApp::new(config)))),
    )
}
