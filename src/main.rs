//! SFG Studio - a signal flow graph editor
//!
//! Draw nodes and gain branches on the canvas, then send the branch list
//! to an external Mason's gain solver for analysis.

use eframe::egui;
use log::info;

use sfg_studio::{AppConfig, SignalFlowEditor};

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    info!("Starting SFG Studio");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("SFG Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "SFG Studio",
        options,
        Box::new(move |_cc| Ok(Box::new(SignalFlowEditor::new(&config)?))),
    )
}
