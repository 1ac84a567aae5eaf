//! Persistent viewer settings.
//!
//! Stored as pretty-printed JSON in
//! `<config dir>/session-replay-viewer/config.json`. Every field has a
//! default, so files written by older builds still load.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use super::error::AppError;
use super::playback::{DEFAULT_SPEED, clamp_speed};

const SETTINGS_DIRNAME: &str = "session-replay-viewer";
const SETTINGS_FILENAME: &str = "config.json";

const MAX_RECENT_FILES: usize = 10;

/// Default distance of a skip backward/forward, in milliseconds.
pub const DEFAULT_SKIP_STEP_MS: u64 = 5_000;

const MIN_SKIP_STEP_MS: u64 = 100;

/// An opaque color, stored as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn color(self) -> Color32 {
        let [r, g, b] = self.0;
        Color32::from_rgb(r, g, b)
    }

    pub fn with_alpha(self, alpha: u8) -> Color32 {
        let [r, g, b] = self.0;
        Color32::from_rgba_unmultiplied(r, g, b, alpha)
    }
}

/// Colors used by the player, trim bar and log panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub playhead: Rgb,
    pub trim_range: Rgb,
    pub annotation: Rgb,
    pub event_tick: Rgb,
    pub background: Rgb,
    pub surface_border: Rgb,
    pub console_warn: Rgb,
    pub console_error: Rgb,
    pub request_failed: Rgb,
    pub text_dim: Rgb,
    pub status_success: Rgb,
    pub status_error: Rgb,
}

impl Default for ColorSettings {
    fn default() -> Self {
        let red = Rgb([244, 67, 54]);
        Self {
            playhead: Rgb([255, 200, 100]),
            trim_range: Rgb([100, 200, 255]),
            annotation: Rgb([255, 215, 0]),
            event_tick: Rgb([120, 120, 130]),
            background: Rgb([30, 30, 35]),
            surface_border: Rgb([60, 60, 65]),
            console_warn: Rgb([255, 193, 7]),
            console_error: red,
            request_failed: red,
            text_dim: Rgb([105, 105, 105]),
            status_success: Rgb([76, 175, 80]),
            status_error: red,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub colors: ColorSettings,
    /// Speed a recording opens at; the last speed the user picked.
    pub default_speed: f32,
    pub skip_step_ms: u64,
    /// Keep the log panels scrolled to the newest visible entry.
    pub auto_follow_logs: bool,
    /// Most recent first.
    pub recent_files: Vec<PathBuf>,
    pub window_size: Option<(f32, f32)>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            colors: ColorSettings::default(),
            default_speed: DEFAULT_SPEED,
            skip_step_ms: DEFAULT_SKIP_STEP_MS,
            auto_follow_logs: true,
            recent_files: Vec::new(),
            window_size: None,
        }
    }
}

impl AppSettings {
    fn default_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(SETTINGS_DIRNAME)
                .join(SETTINGS_FILENAME),
        )
    }

    /// Settings from the default location.
    ///
    /// A missing file gives the defaults silently; a broken one gives the
    /// defaults with a warning.
    pub fn load() -> Self {
        let Some(path) = Self::default_path().filter(|p| p.exists()) else {
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("{} Using defaults.", e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let load_error = |e: &dyn Display| AppError::SettingsLoadError {
            reason: format!("{}: {}", path.display(), e),
        };
        let content = fs::read_to_string(path).map_err(|e| load_error(&e))?;
        serde_json::from_str(&content).map_err(|e| load_error(&e))
    }

    pub fn save(&self) -> Result<(), AppError> {
        let path = Self::default_path().ok_or_else(|| AppError::SettingsSaveError {
            reason: "this system has no config directory".to_string(),
        })?;
        self.save_to(&path)
    }

    /// Write to `path`, creating its directory first.
    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        let save_error = |e: &dyn Display| AppError::SettingsSaveError {
            reason: format!("{}: {}", path.display(), e),
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| save_error(&e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| save_error(&e))?;
        fs::write(path, json).map_err(|e| save_error(&e))?;
        log::debug!("settings written to {}", path.display());
        Ok(())
    }

    /// Put `path` at the front of the recent list.
    pub fn push_recent(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| *p != path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    pub fn forget_recent(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
    }

    /// Speed to open the next recording at, within the supported range.
    pub fn opening_speed(&self) -> f32 {
        clamp_speed(self.default_speed)
    }

    pub fn remember_speed(&mut self, speed: f32) {
        self.default_speed = clamp_speed(speed);
    }

    pub fn skip_step(&self) -> u64 {
        self.skip_step_ms.max(MIN_SKIP_STEP_MS)
    }

    pub fn remember_window_size(&mut self, width: f32, height: f32) {
        self.window_size = Some((width, height));
    }
}
