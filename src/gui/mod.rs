//! GUI module for the session replay viewer.
//!
//! This module contains the egui-based user interface components
//! including the main application window, player surface, trim bar,
//! playback controls and log panels.

mod app;
mod controls;
mod dialogs;
mod logs;
mod player;
mod trim;

pub use app::ReplayViewerApp;
