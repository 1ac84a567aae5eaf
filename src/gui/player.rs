//! Player surface.
//!
//! The one area the replay engine paints into. It reports a stable
//! [`SurfaceId`] every frame so the app can bind the engine to it, draws the
//! engine's current frame and an event strip with clickable annotation
//! markers below it.

use eframe::egui::{self, Color32, Painter, Pos2, Rect, Stroke};

use crate::core::config::ColorSettings;
use crate::core::engine::{Frame, SurfaceId};
use crate::core::recording::Annotation;
use crate::core::timeline::NormalizedEvent;

/// Height of the event strip under the surface.
const STRIP_HEIGHT: f32 = 28.0;

/// Radius of an annotation marker.
const MARKER_RADIUS: f32 = 5.0;

/// Fallback viewport when the recording carries no meta event.
const DEFAULT_VIEWPORT: (u32, u32) = (1280, 800);

/// Margin around the scaled viewport.
const SURFACE_MARGIN: f32 = 12.0;

/// What the player reports back to the app.
#[derive(Debug, Default)]
pub struct PlayerOutput {
    /// Surface committed this frame
    pub surface: Option<SurfaceId>,
    /// Offset of a clicked annotation
    pub seek_to: Option<u64>,
}

/// Fit a viewport of `size` into `area`, keeping its aspect ratio.
pub fn fit_viewport(area: Rect, size: (u32, u32)) -> Rect {
    let (w, h) = (size.0.max(1) as f32, size.1.max(1) as f32);
    let scale = (area.width() / w).min(area.height() / h).max(0.0);
    Rect::from_center_size(area.center(), egui::vec2(w * scale, h * scale))
}

/// Pointer position carried by an interaction event, if any.
pub fn pointer_position(event: &NormalizedEvent) -> Option<(f64, f64)> {
    let data = &event.data;
    let from = |value: &serde_json::Value| {
        Some((value.get("x")?.as_f64()?, value.get("y")?.as_f64()?))
    };
    from(data).or_else(|| {
        data.get("positions")?
            .as_array()?
            .last()
            .and_then(from)
    })
}

/// Renders the player surface and its event strip.
pub struct PlayerRenderer<'a> {
    frame: Option<Frame<'a>>,
    events: &'a [NormalizedEvent],
    annotations: &'a [Annotation],
    duration: u64,
    colors: &'a ColorSettings,
}

impl<'a> PlayerRenderer<'a> {
    pub fn new(
        frame: Option<Frame<'a>>,
        events: &'a [NormalizedEvent],
        annotations: &'a [Annotation],
        duration: u64,
        colors: &'a ColorSettings,
    ) -> Self {
        Self {
            frame,
            events,
            annotations,
            duration,
            colors,
        }
    }

    pub fn render(&self, ui: &mut egui::Ui) -> PlayerOutput {
        let mut output = PlayerOutput::default();

        let available = ui.available_size();
        let surface_height = (available.y - STRIP_HEIGHT - 8.0).max(80.0);
        let surface_id = ui.make_persistent_id("player_surface");
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(available.x, surface_height),
            egui::Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        self.draw_surface(&painter, rect);
        output.surface = Some(SurfaceId(surface_id.value()));

        ui.add_space(4.0);
        output.seek_to = self.draw_strip(ui);

        output
    }

    fn draw_surface(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, self.colors.background.color());

        let Some(frame) = &self.frame else {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Waiting for replay engine…",
                egui::FontId::proportional(16.0),
                self.colors.text_dim.color(),
            );
            return;
        };

        let viewport_size = frame.viewport.unwrap_or(DEFAULT_VIEWPORT);
        let viewport = fit_viewport(rect.shrink(SURFACE_MARGIN), viewport_size);
        painter.rect_filled(viewport, 4.0, Color32::from_gray(245));
        painter.rect_stroke(
            viewport,
            4.0,
            Stroke::new(1.0, self.colors.surface_border.color()),
            egui::StrokeKind::Outside,
        );

        if let Some(href) = frame.href {
            painter.text(
                viewport.left_top() + egui::vec2(8.0, 6.0),
                egui::Align2::LEFT_TOP,
                href,
                egui::FontId::monospace(11.0),
                Color32::from_gray(90),
            );
        }

        if let Some((x, y)) = frame.last_event.and_then(pointer_position) {
            let scale = viewport.width() / viewport_size.0.max(1) as f32;
            let pos = viewport.left_top() + egui::vec2(x as f32 * scale, y as f32 * scale);
            if viewport.contains(pos) {
                painter.circle_filled(pos, 5.0, self.colors.playhead.color());
            }
        }

        let last = frame
            .last_event
            .map(|e| e.kind.label())
            .unwrap_or("none");
        painter.text(
            rect.right_bottom() - egui::vec2(8.0, 6.0),
            egui::Align2::RIGHT_BOTTOM,
            format!(
                "{} / {} events · last: {} · {}x{}",
                frame.applied, frame.total, last, viewport_size.0, viewport_size.1
            ),
            egui::FontId::monospace(11.0),
            self.colors.text_dim.color(),
        );
    }

    /// Draw event ticks, the playhead and annotation markers.
    /// Returns the offset of a clicked annotation.
    fn draw_strip(&self, ui: &mut egui::Ui) -> Option<u64> {
        let width = ui.available_width();
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(width, STRIP_HEIGHT), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 2.0, self.colors.background.color());

        if self.duration == 0 {
            return None;
        }
        let x_of = |ms: u64| {
            rect.left() + rect.width() * (ms.min(self.duration) as f32 / self.duration as f32)
        };

        let tick_stroke = Stroke::new(1.0, self.colors.event_tick.color());
        for event in self.events {
            let x = x_of(event.offset);
            painter.line_segment(
                [Pos2::new(x, rect.bottom() - 8.0), Pos2::new(x, rect.bottom())],
                tick_stroke,
            );
        }

        if let Some(frame) = &self.frame {
            let x = x_of(frame.offset);
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(2.0, self.colors.playhead.color()),
            );
        }

        let mut clicked = None;
        for (index, note) in self.annotations.iter().enumerate() {
            let center = Pos2::new(x_of(note.timestamp), rect.top() + MARKER_RADIUS + 2.0);
            let hit = Rect::from_center_size(center, egui::Vec2::splat(MARKER_RADIUS * 3.0));
            let response = ui
                .interact(
                    hit,
                    ui.id().with(("annotation", index)),
                    egui::Sense::click(),
                )
                .on_hover_text(note.text.as_str());

            let radius = if response.hovered() {
                MARKER_RADIUS + 1.5
            } else {
                MARKER_RADIUS
            };
            painter.circle_filled(center, radius, self.colors.annotation.color());

            if response.clicked() {
                clicked = Some(note.timestamp);
            }
        }

        clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recording::EventKind;
    use serde_json::json;

    fn event(data: serde_json::Value) -> NormalizedEvent {
        NormalizedEvent {
            offset: 0,
            kind: EventKind::IncrementalSnapshot,
            data,
        }
    }

    #[test]
    fn test_fit_viewport_keeps_aspect() {
        let area = Rect::from_min_size(Pos2::ZERO, egui::vec2(400.0, 400.0));
        let fitted = fit_viewport(area, (1600, 800));
        assert_eq!(fitted.width(), 400.0);
        assert_eq!(fitted.height(), 200.0);
        assert_eq!(fitted.center(), area.center());
    }

    #[test]
    fn test_pointer_position_from_click() {
        assert_eq!(
            pointer_position(&event(json!({ "source": 2, "x": 10, "y": 20 }))),
            Some((10.0, 20.0))
        );
    }

    #[test]
    fn test_pointer_position_from_move() {
        let moved = event(json!({
            "source": 1,
            "positions": [ { "x": 1, "y": 2 }, { "x": 30, "y": 40 } ]
        }));
        assert_eq!(pointer_position(&moved), Some((30.0, 40.0)));
        assert_eq!(pointer_position(&event(json!({ "source": 0 }))), None);
    }
}
