//! Desktop window: template label, camera label and the two buttons.

mod app;
mod label;

pub use app::SiftApp;
pub use label::{ImageLabel, LabelSink};

use crate::cli::StartupOptions;

/// Open the main window and block until it is closed.
pub fn run(options: StartupOptions) -> eframe::Result<()> {
    let window_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("sift-cam")
            .with_inner_size([720.0, 360.0])
            .with_min_inner_size([480.0, 280.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "sift-cam",
        window_options,
        Box::new(move |cc| Ok(Box::new(SiftApp::new(cc, options)))),
    )
}
