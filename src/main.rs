mod app;
mod color;
mod state;
mod ui;

use app::ThermalPandaApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional data folder on the command line, otherwise File → Open folder…
    let folder = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Thermal Panda – TGA / DSC Curve Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(ThermalPandaApp::with_folder(folder.as_deref())))),
    )
}
