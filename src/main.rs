//! Session Replay Viewer - plays back recorded browser sessions with their
//! console and network logs on a single timeline.

mod core;
mod gui;

use std::path::PathBuf;

use crate::core::config::AppSettings;
use gui::ReplayViewerApp;

/// Default window size when none was saved.
const DEFAULT_WINDOW_SIZE: [f32; 2] = [1280.0, 800.0];

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = AppSettings::load();
    let window_size = settings
        .window_size
        .map(|(w, h)| [w, h])
        .unwrap_or(DEFAULT_WINDOW_SIZE);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Session Replay Viewer")
            .with_inner_size(window_size)
            .with_min_inner_size([800.0, 500.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Session Replay Viewer",
        options,
        Box::new(|cc| Ok(Box::new(ReplayViewerApp::new(cc, settings, initial_file)))),
    )
}
