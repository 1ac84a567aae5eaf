//! Console and network log panels.
//!
//! Both panels list only the entries at or before the playhead. Clicking an
//! entry seeks playback to its timestamp.

use eframe::egui::{self, Color32, RichText};

use crate::core::config::ColorSettings;
use crate::core::filter::{LevelGroup, LogFilterState};
use crate::core::playback::format_time;
use crate::core::recording::{ConsoleLevel, ConsoleLogEntry, NetworkLogEntry};

/// Which log the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTab {
    #[default]
    Console,
    Network,
}

/// Renders the log panel. Returns the timestamp of a clicked entry.
pub struct LogsRenderer<'a> {
    console: &'a [ConsoleLogEntry],
    network: &'a [NetworkLogEntry],
    current_time: u64,
    /// Timestamp of the active search match
    highlight: Option<u64>,
    auto_follow: bool,
    colors: &'a ColorSettings,
}

impl<'a> LogsRenderer<'a> {
    pub fn new(
        console: &'a [ConsoleLogEntry],
        network: &'a [NetworkLogEntry],
        current_time: u64,
        highlight: Option<u64>,
        auto_follow: bool,
        colors: &'a ColorSettings,
    ) -> Self {
        Self {
            console,
            network,
            current_time,
            highlight,
            auto_follow,
            colors,
        }
    }

    pub fn render(
        &self,
        ui: &mut egui::Ui,
        tab: &mut LogTab,
        filter: &mut LogFilterState,
    ) -> Option<u64> {
        let console = filter.visible_console(self.console, self.current_time);
        let network = filter.visible_network(self.network, self.current_time);

        ui.horizontal(|ui| {
            ui.selectable_value(tab, LogTab::Console, format!("Console ({})", console.len()));
            ui.selectable_value(tab, LogTab::Network, format!("Network ({})", network.len()));
        });
        ui.separator();

        match tab {
            LogTab::Console => {
                self.render_console_filters(ui, filter);
                ui.separator();
                self.render_console(ui, &console)
            }
            LogTab::Network => {
                ui.checkbox(&mut filter.failed_requests_only, "Failed requests only");
                ui.separator();
                self.render_network(ui, &network)
            }
        }
    }

    fn render_console_filters(&self, ui: &mut egui::Ui, filter: &mut LogFilterState) {
        ui.horizontal(|ui| {
            for group in [LevelGroup::Verbose, LevelGroup::Warn, LevelGroup::Error] {
                let mut visible = filter.is_group_visible(group);
                let can_toggle = filter.can_disable_group(group);
                let response =
                    ui.add_enabled(can_toggle, egui::Checkbox::new(&mut visible, group.label()));
                if response.changed() {
                    filter.set_group_visible(group, visible);
                }
                if !can_toggle {
                    response.on_disabled_hover_text("At least one level must stay visible");
                }
            }
        });
    }

    fn render_console(&self, ui: &mut egui::Ui, entries: &[&ConsoleLogEntry]) -> Option<u64> {
        let mut clicked = None;

        egui::ScrollArea::vertical()
            .id_salt("console_scroll")
            .auto_shrink([false, false])
            .stick_to_bottom(self.auto_follow)
            .show(ui, |ui| {
                if entries.is_empty() {
                    ui.weak("No console output yet.");
                }
                for entry in entries {
                    let color = self.level_color(entry.level, ui.visuals().text_color());
                    let text = RichText::new(format!(
                        "{}  {:<5}  {}",
                        format_time(entry.timestamp),
                        entry.level.label(),
                        entry.message
                    ))
                    .monospace()
                    .color(color);

                    let selected = self.highlight == Some(entry.timestamp);
                    if ui
                        .selectable_label(selected, text)
                        .on_hover_text("Jump to this moment")
                        .clicked()
                    {
                        clicked = Some(entry.timestamp);
                    }
                }
            });

        clicked
    }

    fn render_network(&self, ui: &mut egui::Ui, entries: &[&NetworkLogEntry]) -> Option<u64> {
        let mut clicked = None;

        egui::ScrollArea::vertical()
            .id_salt("network_scroll")
            .auto_shrink([false, false])
            .stick_to_bottom(self.auto_follow)
            .show(ui, |ui| {
                if entries.is_empty() {
                    ui.weak("No requests yet.");
                }
                for entry in entries {
                    let status = entry
                        .status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "---".to_string());
                    let duration = entry
                        .duration_ms
                        .map(|d| format!("{} ms", d))
                        .unwrap_or_default();

                    let mut text = RichText::new(format!(
                        "{}  {:<6} {}  {}  {}",
                        format_time(entry.timestamp),
                        entry.method,
                        status,
                        entry.url,
                        duration
                    ))
                    .monospace();
                    if entry.is_failed() {
                        text = text.color(self.colors.request_failed.color());
                    }

                    let selected = self.highlight == Some(entry.timestamp);
                    if ui
                        .selectable_label(selected, text)
                        .on_hover_text(entry.url.as_str())
                        .clicked()
                    {
                        clicked = Some(entry.timestamp);
                    }
                }
            });

        clicked
    }

    fn level_color(&self, level: ConsoleLevel, default: Color32) -> Color32 {
        match level {
            ConsoleLevel::Warn => self.colors.console_warn.color(),
            ConsoleLevel::Error => self.colors.console_error.color(),
            ConsoleLevel::Debug => self.colors.text_dim.color(),
            ConsoleLevel::Log | ConsoleLevel::Info => default,
        }
    }
}
