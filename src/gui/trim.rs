//! Trim control view.
//!
//! Two handles over `[0, duration]` with a read-only playhead marker and a
//! "trimmed" indicator. Every handle movement is reported immediately.

use eframe::egui::{self, Color32, Rect, Stroke};

use crate::core::config::ColorSettings;
use crate::core::playback::{PlaybackState, TrimRange, format_time};

/// Height of the painted range bar.
const BAR_HEIGHT: f32 = 14.0;

/// Width of the playhead marker.
const MARKER_WIDTH: f32 = 2.0;

/// User actions from the trim control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimAction {
    /// New handle positions in milliseconds
    SetRange { start: u64, end: u64 },
    /// Restore `[0, duration]`
    Reset,
}

/// Playhead position as a percentage of the duration (0 for an empty recording).
pub fn playhead_percent(state: &PlaybackState) -> f32 {
    state.progress() * 100.0
}

/// Renders the trim bar and handles.
pub struct TrimRenderer<'a> {
    enabled: bool,
    playback: &'a PlaybackState,
    trim: TrimRange,
    colors: &'a ColorSettings,
}

impl<'a> TrimRenderer<'a> {
    pub fn new(
        enabled: bool,
        playback: &'a PlaybackState,
        trim: TrimRange,
        colors: &'a ColorSettings,
    ) -> Self {
        Self {
            enabled,
            playback,
            trim,
            colors,
        }
    }

    pub fn render(&self, ui: &mut egui::Ui) -> Option<TrimAction> {
        let mut action = None;
        let duration = self.playback.duration;
        let trimmed = self.trim.is_trimmed(duration);

        ui.horizontal(|ui| {
            ui.label("Trim:");
            if trimmed {
                ui.colored_label(self.colors.trim_range.color(), "✂ Trimmed")
                    .on_hover_text(format!(
                        "Playing {} of {}",
                        format_time(self.trim.len()),
                        format_time(duration)
                    ));
            } else {
                ui.weak("Full recording");
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_enabled_ui(self.enabled && trimmed, |ui| {
                    if ui
                        .button("Reset")
                        .on_hover_text("Restore the full recording")
                        .clicked()
                    {
                        action = Some(TrimAction::Reset);
                    }
                });
                ui.weak(format!("{:.1}%", playhead_percent(self.playback)));
            });
        });

        self.draw_bar(ui);

        ui.add_enabled_ui(self.enabled, |ui| {
            let upper = duration.max(1);
            let mut start = self.trim.start;
            let mut end = self.trim.end;

            let start_changed = ui
                .add(
                    egui::Slider::new(&mut start, 0..=upper)
                        .text("Start")
                        .custom_formatter(|v, _| format_time(v as u64)),
                )
                .changed();
            let end_changed = ui
                .add(
                    egui::Slider::new(&mut end, 0..=upper)
                        .text("End")
                        .custom_formatter(|v, _| format_time(v as u64)),
                )
                .changed();

            if start_changed || end_changed {
                // Dragging one handle past the other pushes it along.
                if start_changed && start > end {
                    end = start;
                }
                if end_changed && end < start {
                    start = end;
                }
                action = Some(TrimAction::SetRange { start, end });
            }
        });

        action
    }

    /// Paint the kept range and the playhead marker.
    fn draw_bar(&self, ui: &mut egui::Ui) {
        let width = ui.available_width();
        let (response, painter) =
            ui.allocate_painter(egui::vec2(width, BAR_HEIGHT), egui::Sense::hover());
        let rect = response.rect;

        painter.rect_filled(rect, 2.0, self.colors.background.color());

        let duration = self.playback.duration;
        if duration > 0 {
            let x_of = |ms: u64| rect.left() + rect.width() * (ms as f32 / duration as f32);
            let kept = Rect::from_min_max(
                egui::pos2(x_of(self.trim.start), rect.top()),
                egui::pos2(x_of(self.trim.end), rect.bottom()),
            );
            painter.rect_filled(kept, 2.0, self.colors.trim_range.with_alpha(90));
        }

        let x = rect.left() + rect.width() * playhead_percent(self.playback) / 100.0;
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            Stroke::new(MARKER_WIDTH, self.colors.playhead.color()),
        );

        painter.rect_stroke(
            rect,
            2.0,
            Stroke::new(1.0, Color32::DARK_GRAY),
            egui::StrokeKind::Inside,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhead_percent() {
        let state = PlaybackState {
            current_time: 2_500,
            duration: 10_000,
            is_playing: true,
        };
        assert_eq!(playhead_percent(&state), 25.0);
    }

    #[test]
    fn test_playhead_percent_empty_recording() {
        assert_eq!(playhead_percent(&PlaybackState::default()), 0.0);
    }
}
