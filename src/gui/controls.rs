//! Transport bar: play/pause, trim-aware jumps, skips, speed and scrubber.
//!
//! The renderer only reads state and reports a [`ControlAction`]; the app
//! forwards it to the synchronizer.

use eframe::egui;

use crate::core::playback::{PlaybackState, SPEED_OPTIONS, TrimRange, format_time};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    TogglePlayPause,
    /// Jump to the trim start
    GoToStart,
    /// Jump to the trim end
    GoToEnd,
    SkipBackward,
    SkipForward,
    SetSpeed(f32),
    /// Scrubber target in milliseconds
    Seek(u64),
}

/// A transport button: icon, hover text and the action it fires.
type TransportButton = (&'static str, String, ControlAction);

pub struct ControlsRenderer<'a> {
    /// False while no engine is attached
    enabled: bool,
    playback: &'a PlaybackState,
    trim: TrimRange,
    speed: f32,
    skip_step_ms: u64,
}

impl<'a> ControlsRenderer<'a> {
    pub fn new(
        enabled: bool,
        playback: &'a PlaybackState,
        trim: TrimRange,
        speed: f32,
        skip_step_ms: u64,
    ) -> Self {
        Self {
            enabled,
            playback,
            trim,
            speed,
            skip_step_ms,
        }
    }

    pub fn render(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            ui.horizontal(|ui| {
                for (icon, hint, button_action) in self.transport() {
                    if ui.button(icon).on_hover_text(hint).clicked() {
                        action = Some(button_action);
                    }
                }
                ui.separator();
                ui.monospace(format!(
                    "{} / {}",
                    format_time(self.playback.current_time),
                    format_time(self.playback.duration)
                ));
                ui.separator();
                if let Some(speed) = self.speed_menu(ui) {
                    action = Some(ControlAction::SetSpeed(speed));
                }
            });

            ui.add_space(4.0);
            if let Some(offset) = self.scrubber(ui) {
                action = Some(ControlAction::Seek(offset));
            }
        });

        action
    }

    fn transport(&self) -> [TransportButton; 5] {
        let step = format!("{:.1}s", self.skip_step_ms as f64 / 1000.0);
        let toggle = if self.playback.is_playing {
            ("⏸", "Pause (Space)".to_string(), ControlAction::TogglePlayPause)
        } else {
            ("▶", "Play (Space)".to_string(), ControlAction::TogglePlayPause)
        };

        [
            ("⏮", "Trim start (Home)".to_string(), ControlAction::GoToStart),
            ("⏪", format!("Back {} (←)", step), ControlAction::SkipBackward),
            toggle,
            ("⏩", format!("Forward {} (→)", step), ControlAction::SkipForward),
            ("⏭", "Trim end (End)".to_string(), ControlAction::GoToEnd),
        ]
    }

    fn speed_menu(&self, ui: &mut egui::Ui) -> Option<f32> {
        let mut picked = None;
        ui.label("Speed:");
        egui::ComboBox::from_id_salt("speed_combo")
            .selected_text(format!("{}x", self.speed))
            .width(60.0)
            .show_ui(ui, |ui| {
                for &preset in SPEED_OPTIONS {
                    let current = (self.speed - preset).abs() < f32::EPSILON;
                    if ui.selectable_label(current, format!("{}x", preset)).clicked() {
                        picked = Some(preset);
                    }
                }
            });
        picked
    }

    /// Spans the whole recording; the synchronizer clamps into the trim range.
    fn scrubber(&self, ui: &mut egui::Ui) -> Option<u64> {
        let end = self.playback.duration.max(1);
        let mut offset = self.playback.current_time.min(end);

        ui.spacing_mut().slider_width = (ui.available_width() - 16.0).max(100.0);
        let mut response = ui.add(egui::Slider::new(&mut offset, 0..=end).show_value(false));
        if self.trim.is_trimmed(self.playback.duration) {
            response = response.on_hover_text(format!(
                "Playback limited to {} - {}",
                format_time(self.trim.start),
                format_time(self.trim.end)
            ));
        }

        response.changed().then_some(offset)
    }
}
