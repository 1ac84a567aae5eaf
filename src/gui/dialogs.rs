//! Error dialog.
//!
//! Shows one [`AppError`] at a time in an egui modal. Pressing Escape or
//! clicking outside dismisses it like the Dismiss button does.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::core::error::AppError;

/// How long the "Copied" confirmation stays up.
const COPIED_NOTICE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDialogAction {
    /// Load this file again
    Retry(PathBuf),
    Dismiss,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorDialogState {
    error: Option<AppError>,
    /// When the report was last copied to the clipboard
    copied_at: Option<Instant>,
}

impl ErrorDialogState {
    /// Open the dialog on `error`, replacing whatever it showed.
    pub fn show(&mut self, error: AppError) {
        self.error = Some(error);
        self.copied_at = None;
    }

    pub fn close(&mut self) {
        self.error = None;
        self.copied_at = None;
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// File to load again, for errors worth retrying.
    pub fn retry_path(&self) -> Option<PathBuf> {
        let error = self.error.as_ref().filter(|e| e.is_retryable())?;
        error.path().map(|p| p.to_path_buf())
    }

    fn copied_recently(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPIED_NOTICE)
    }
}

pub struct ErrorDialogRenderer<'a> {
    state: &'a mut ErrorDialogState,
}

impl<'a> ErrorDialogRenderer<'a> {
    pub fn new(state: &'a mut ErrorDialogState) -> Self {
        Self { state }
    }

    /// Draw the dialog if an error is pending and report the button pressed.
    pub fn render(&mut self, ctx: &egui::Context) -> Option<ErrorDialogAction> {
        let error = self.state.error.as_ref()?;
        let title = error.title();
        let summary = error.to_string();
        let facts = error.facts();
        let retry_path = self.state.retry_path();
        let now = Instant::now();
        let copied = self.state.copied_recently(now);

        let mut action = None;
        let mut copy_report = false;

        let modal = egui::Modal::new(egui::Id::new("error_dialog")).show(ctx, |ui| {
            ui.set_width(420.0);
            ui.heading(format!("⚠ {}", title));
            ui.add_space(6.0);
            ui.label(summary);

            if !facts.is_empty() {
                ui.add_space(6.0);
                egui::CollapsingHeader::new("Details")
                    .id_salt("error_details")
                    .show(ui, |ui| {
                        egui::Grid::new("error_facts")
                            .num_columns(2)
                            .striped(true)
                            .show(ui, |ui| {
                                for (label, value) in &facts {
                                    ui.strong(*label);
                                    let value = egui::RichText::new(value).monospace();
                                    ui.add(egui::Label::new(value).wrap());
                                    ui.end_row();
                                }
                            });
                    });
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("📋 Copy report").clicked() {
                    copy_report = true;
                }
                if copied {
                    ui.weak("Copied");
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        action = Some(ErrorDialogAction::Dismiss);
                    }
                    if let Some(path) = &retry_path
                        && ui.button("🔄 Retry").clicked()
                    {
                        action = Some(ErrorDialogAction::Retry(path.clone()));
                    }
                });
            });
        });

        if copy_report {
            if let Some(error) = &self.state.error {
                ctx.copy_text(error.report());
            }
            self.state.copied_at = Some(now);
        }
        if copied || copy_report {
            ctx.request_repaint_after(COPIED_NOTICE);
        }

        if action.is_none() && modal.should_close() {
            action = Some(ErrorDialogAction::Dismiss);
        }
        if action.is_some() {
            self.state.close();
        }
        action
    }
}
