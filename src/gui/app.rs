//! The viewer window.
//!
//! [`ReplayViewerApp`] wires the loader, the synchronizer and the panels
//! together. The synchronizer is the only owner of playback state; every panel
//! reads it and reports user intent back through action enums.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::core::config::AppSettings;
use crate::core::engine::{ClockEngineFactory, SurfaceId};
use crate::core::error::AppError;
use crate::core::filter::LogFilterState;
use crate::core::loader::{ACCEPTED_EXTENSIONS, LoadOutcome, RecordingLoader};
use crate::core::playback::{next_speed_preset, prev_speed_preset};
use crate::core::recording::Recording;
use crate::core::search::{SearchQuery, SearchResult, find_matches};
use crate::core::sync::Synchronizer;

use super::controls::{ControlAction, ControlsRenderer};
use super::dialogs::{ErrorDialogAction, ErrorDialogRenderer, ErrorDialogState};
use super::logs::{LogTab, LogsRenderer};
use super::player::PlayerRenderer;
use super::trim::{TrimAction, TrimRenderer};

/// Window title when no recording is open.
const APP_TITLE: &str = "Session Replay Viewer";

/// Where the viewer is in opening a recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppState {
    /// No recording has been loaded yet (initial state)
    #[default]
    NoFileLoaded,
    /// A load is running on the loader thread
    Loading,
    /// A recording is loaded
    Ready,
}

impl AppState {
    /// Search needs a loaded recording.
    pub fn toolbar_enabled(&self) -> bool {
        matches!(self, AppState::Ready)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusKind {
    Success,
    Error,
}

/// Transient toolbar notice.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub created_at: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    const LIFETIME: Duration = Duration::from_secs(5);

    pub fn is_visible(&self) -> bool {
        self.created_at.elapsed() < Self::LIFETIME
    }
}

/// Search box contents and the waypoints it produced.
#[derive(Debug, Default)]
struct SearchState {
    text: String,
    case_sensitive: bool,
    result: SearchResult,
}

/// Top-level eframe app.
pub struct ReplayViewerApp {
    state: AppState,
    settings: AppSettings,
    recording: Option<Recording>,
    loaded_file_path: Option<PathBuf>,
    sync: Synchronizer,
    factory: ClockEngineFactory,
    /// `None` if the loader thread could not be started
    loader: Option<RecordingLoader>,
    /// Player surface committed during the previous frame
    surface: Option<SurfaceId>,
    sync_error_reported: bool,
    filter: LogFilterState,
    log_tab: LogTab,
    search: SearchState,
    error_dialog: ErrorDialogState,
    status_message: Option<StatusMessage>,
}

impl ReplayViewerApp {
    /// Create a new application instance, optionally opening `initial_file`.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: AppSettings,
        initial_file: Option<PathBuf>,
    ) -> Self {
        let mut error_dialog = ErrorDialogState::default();
        let loader = match RecordingLoader::spawn() {
            Ok(loader) => Some(loader),
            Err(e) => {
                log::error!("{}", e);
                error_dialog.show(e);
                None
            }
        };

        let mut app = Self {
            state: AppState::NoFileLoaded,
            settings,
            recording: None,
            loaded_file_path: None,
            sync: Synchronizer::new(),
            factory: ClockEngineFactory,
            loader,
            surface: None,
            sync_error_reported: false,
            filter: LogFilterState::new(),
            log_tab: LogTab::default(),
            search: SearchState::default(),
            error_dialog,
            status_message: None,
        };

        if let Some(path) = initial_file {
            app.load_file(path);
        }
        app
    }

    /// Open a file dialog and load the selected recording.
    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Session Recording", ACCEPTED_EXTENSIONS)
            .set_title("Open Session Recording")
            .pick_file()
        {
            self.load_file(path);
        }
    }

    /// Hand a file to the loader thread.
    fn load_file(&mut self, path: PathBuf) {
        let Some(loader) = self.loader.as_mut() else {
            self.show_error(AppError::LoaderUnavailable {
                reason: "The loader thread is not running".to_string(),
            });
            return;
        };

        log::info!("opening {}", path.display());
        match loader.request(path, Instant::now()) {
            Ok(()) => self.state = AppState::Loading,
            Err(e) => self.show_error(e),
        }
    }

    /// Apply the result of a finished load.
    fn finish_load(&mut self, outcome: LoadOutcome) {
        let LoadOutcome { path, result } = outcome;

        match result {
            Ok(recording) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "file".to_string());
                log::info!(
                    "loaded {} ({} events, {} console, {} network)",
                    file_name,
                    recording.events.len(),
                    recording.console_logs.len(),
                    recording.network_logs.len()
                );

                self.sync.initialize(&recording.events);
                self.sync.set_speed(self.settings.opening_speed());
                self.sync_error_reported = false;
                self.filter.reset();
                self.search.result = SearchResult::default();

                self.status_message = Some(StatusMessage::new(
                    format!(
                        "Loaded: {} ({} events, {} log entries)",
                        file_name,
                        recording.events.len(),
                        recording.console_logs.len() + recording.network_logs.len()
                    ),
                    StatusKind::Success,
                ));

                self.recording = Some(recording);
                self.loaded_file_path = Some(path.clone());
                self.state = AppState::Ready;
                self.refresh_search();

                self.settings.push_recent(path);
                self.save_settings();
            }
            Err(e) => {
                log::warn!("failed to load {}: {}", path.display(), e);
                if matches!(e, AppError::FileNotFound { .. }) {
                    self.settings.forget_recent(&path);
                    self.save_settings();
                }
                self.state = if self.recording.is_some() {
                    AppState::Ready
                } else {
                    AppState::NoFileLoaded
                };
                self.show_error(e);
            }
        }
    }

    fn show_error(&mut self, error: AppError) {
        self.status_message = Some(StatusMessage::new(
            error.to_string(),
            StatusKind::Error,
        ));
        self.error_dialog.show(error);
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            log::warn!("{}", e);
            self.status_message = Some(StatusMessage::new(
                e.to_string(),
                StatusKind::Error,
            ));
        }
    }

    fn window_title(&self) -> String {
        let name = self
            .recording
            .as_ref()
            .and_then(|r| r.metadata.title.clone())
            .or_else(|| {
                self.loaded_file_path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
            });
        match name {
            Some(name) => format!("{} - {}", name, APP_TITLE),
            None => APP_TITLE.to_string(),
        }
    }

    /// Recompute search matches after the query or recording changed.
    fn refresh_search(&mut self) {
        let Some(recording) = &self.recording else {
            self.search.result = SearchResult::default();
            return;
        };

        let mut query = SearchQuery::new(self.search.text.clone());
        if self.search.case_sensitive {
            query = query.case_sensitive();
        }
        self.search.result = SearchResult::from_matches(find_matches(recording, &query));
        self.search
            .result
            .set_closest_to_time(self.sync.state().current_time);
    }
}

impl eframe::App for ReplayViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if let Some(outcome) = self.loader.as_mut().and_then(|l| l.poll(now)) {
            self.finish_load(outcome);
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));
        }

        self.handle_dropped_files(ctx);

        // Bind the engine to the surface committed last frame.
        match self.surface {
            Some(surface) => self.sync.attach(surface, &self.factory),
            None if self.sync.has_engine() => self.sync.teardown(),
            None => {}
        }
        self.sync.pump(now);
        self.report_sync_error();

        if let Some(action) = self.handle_keyboard_shortcuts(ctx) {
            self.handle_control_action(action);
        }

        self.render_toolbar(ctx);
        self.render_controls(ctx);
        self.render_trim(ctx);
        self.render_logs(ctx);
        self.render_player(ctx);
        self.render_error_dialog(ctx);

        // A pending engine binds to this frame's surface on the next one.
        let busy = self.loader.as_ref().is_some_and(RecordingLoader::is_busy);
        if self.sync.state().is_playing || self.sync.is_pending() || busy {
            ctx.request_repaint();
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
                self.settings.remember_window_size(rect.width(), rect.height());
            }
            self.save_settings();
        }
    }
}

impl ReplayViewerApp {
    /// Surface a replay failure once per recording.
    fn report_sync_error(&mut self) {
        if self.sync_error_reported {
            return;
        }
        if let Some(e) = self.sync.last_error() {
            self.status_message = Some(StatusMessage::new(
                format!("Cannot replay this recording: {}", e),
                StatusKind::Error,
            ));
            self.sync_error_reported = true;
        }
    }

    /// Load the first dropped file with an accepted extension.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> =
            ctx.input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());

        if let Some(path) = dropped.into_iter().next() {
            self.load_file(path);
        }
    }

    /// Handle keyboard shortcuts for playback control.
    ///
    /// Shortcuts only work when an engine is attached and no text field has focus.
    /// They are ignored while the error dialog is open.
    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) -> Option<ControlAction> {
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::O)) {
            self.open_file_dialog();
            return None;
        }

        if !self.sync.has_engine() || self.error_dialog.has_error() || ctx.wants_keyboard_input()
        {
            return None;
        }

        let speed = self.sync.speed();
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Space) {
                return Some(ControlAction::TogglePlayPause);
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                return Some(ControlAction::SkipBackward);
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                return Some(ControlAction::SkipForward);
            }
            if i.key_pressed(egui::Key::Home) {
                return Some(ControlAction::GoToStart);
            }
            if i.key_pressed(egui::Key::End) {
                return Some(ControlAction::GoToEnd);
            }
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                return Some(ControlAction::SetSpeed(next_speed_preset(speed)));
            }
            if i.key_pressed(egui::Key::Minus) {
                return Some(ControlAction::SetSpeed(prev_speed_preset(speed)));
            }
            None
        })
    }

    /// Forward a control action to the synchronizer.
    fn handle_control_action(&mut self, action: ControlAction) {
        let step = self.settings.skip_step() as i64;
        match action {
            ControlAction::TogglePlayPause => self.sync.toggle_play_pause(),
            ControlAction::GoToStart => self.sync.seek(self.sync.trim().start as i64),
            ControlAction::GoToEnd => self.sync.seek(self.sync.trim().end as i64),
            ControlAction::SkipBackward => self.sync.skip(-step),
            ControlAction::SkipForward => self.sync.skip(step),
            ControlAction::SetSpeed(speed) => {
                self.sync.set_speed(speed);
                self.settings.remember_speed(self.sync.speed());
                self.save_settings();
            }
            ControlAction::Seek(offset) => self.sync.seek(offset as i64),
        }
    }

    /// Render the top toolbar: file loading and log search.
    fn render_toolbar(&mut self, ctx: &egui::Context) {
        let search_enabled = self.state.toolbar_enabled();
        let mut open_clicked = false;
        let mut recent_clicked: Option<PathBuf> = None;
        let mut search_changed = false;
        let mut jump: Option<u64> = None;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(APP_TITLE);
                ui.separator();

                if ui.button("📂 Open").on_hover_text("Open a recording (Ctrl+O)").clicked() {
                    open_clicked = true;
                }

                ui.add_enabled_ui(!self.settings.recent_files.is_empty(), |ui| {
                    ui.menu_button("Recent", |ui| {
                        for path in &self.settings.recent_files {
                            let label = path
                                .file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_else(|| path.display().to_string());
                            if ui
                                .button(label)
                                .on_hover_text(path.display().to_string())
                                .clicked()
                            {
                                recent_clicked = Some(path.clone());
                                ui.close();
                            }
                        }
                    });
                });

                ui.separator();

                ui.add_enabled_ui(search_enabled, |ui| {
                    ui.label("🔍");
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.search.text)
                            .hint_text("Search logs")
                            .desired_width(180.0),
                    );
                    if response.changed() {
                        search_changed = true;
                    }
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        jump = self.search.result.next();
                    }

                    if ui
                        .toggle_value(&mut self.search.case_sensitive, "Aa")
                        .on_hover_text("Match case")
                        .changed()
                    {
                        search_changed = true;
                    }

                    let has_matches = !self.search.result.is_empty();
                    ui.add_enabled_ui(has_matches, |ui| {
                        if ui.small_button("◀").on_hover_text("Previous match").clicked() {
                            jump = self.search.result.prev();
                        }
                        if ui.small_button("▶").on_hover_text("Next match").clicked() {
                            jump = self.search.result.next();
                        }
                    });

                    if let Some(position) = self.search.result.current_position() {
                        ui.label(format!("{} of {}", position, self.search.result.count()));
                    } else if !self.search.text.trim().is_empty() {
                        ui.weak("No matches");
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_status_message(ui);
                });
            });
        });

        if open_clicked {
            self.open_file_dialog();
        }
        if let Some(path) = recent_clicked {
            self.load_file(path);
        }
        if search_changed {
            self.refresh_search();
            jump = self.search.result.current();
        }
        if let Some(offset) = jump {
            self.sync.seek(offset as i64);
        }
    }

    /// Render the status message if one is active.
    fn render_status_message(&mut self, ui: &mut egui::Ui) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|msg| !msg.is_visible())
        {
            self.status_message = None;
            return;
        }

        let Some(msg) = &self.status_message else {
            return;
        };
        let color = match msg.kind {
            StatusKind::Success => self.settings.colors.status_success.color(),
            StatusKind::Error => self.settings.colors.status_error.color(),
        };
        let text = msg.text.clone();

        let mut dismiss_clicked = false;
        ui.horizontal(|ui| {
            if ui.small_button("✕").clicked() {
                dismiss_clicked = true;
            }
            ui.colored_label(color, text);
        });

        if dismiss_clicked {
            self.status_message = None;
        }
    }

    /// Render the bottom playback controls.
    fn render_controls(&mut self, ctx: &egui::Context) {
        let playback = self.sync.state();
        let mut action: Option<ControlAction> = None;

        egui::TopBottomPanel::bottom("controls")
            .min_height(64.0)
            .show(ctx, |ui| {
                let renderer = ControlsRenderer::new(
                    self.sync.has_engine(),
                    &playback,
                    self.sync.trim(),
                    self.sync.speed(),
                    self.settings.skip_step(),
                );
                action = renderer.render(ui);
            });

        if let Some(action) = action {
            self.handle_control_action(action);
        }
    }

    /// Render the trim control above the playback controls.
    fn render_trim(&mut self, ctx: &egui::Context) {
        if self.state == AppState::NoFileLoaded {
            return;
        }

        let playback = self.sync.state();
        let mut action: Option<TrimAction> = None;

        egui::TopBottomPanel::bottom("trim").show(ctx, |ui| {
            let renderer = TrimRenderer::new(
                self.sync.has_engine(),
                &playback,
                self.sync.trim(),
                &self.settings.colors,
            );
            action = renderer.render(ui);
        });

        match action {
            Some(TrimAction::SetRange { start, end }) => self.sync.set_trim(start, end),
            Some(TrimAction::Reset) => self.sync.reset_trim(),
            None => {}
        }
    }

    /// Render the console/network side panel.
    fn render_logs(&mut self, ctx: &egui::Context) {
        let Some(recording) = &self.recording else {
            return;
        };

        let mut seek_to: Option<u64> = None;
        egui::SidePanel::right("logs")
            .resizable(true)
            .default_width(420.0)
            .min_width(260.0)
            .show(ctx, |ui| {
                let renderer = LogsRenderer::new(
                    &recording.console_logs,
                    &recording.network_logs,
                    self.sync.state().current_time,
                    self.search.result.current(),
                    self.settings.auto_follow_logs,
                    &self.settings.colors,
                );
                seek_to = renderer.render(ui, &mut self.log_tab, &mut self.filter);
            });

        if let Some(offset) = seek_to {
            self.sync.seek(offset as i64);
        }
    }

    /// Render the player surface, or a placeholder.
    ///
    /// Records which surface (if any) was committed so the next frame can
    /// bind or release the engine.
    fn render_player(&mut self, ctx: &egui::Context) {
        let mut surface = None;
        let mut seek_to = None;

        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            AppState::NoFileLoaded => Self::render_no_file_placeholder(ui),
            AppState::Loading if self.recording.is_none() => {
                self.render_loading_placeholder(ui);
            }
            AppState::Loading | AppState::Ready => {
                let Some(recording) = &self.recording else {
                    return;
                };
                if let Some(e) = self.sync.last_error() {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.heading("⚠ Cannot replay this recording");
                        ui.label(e.to_string());
                    });
                    return;
                }

                let events = self.sync.events().map(|e| &e[..]).unwrap_or(&[]);
                let renderer = PlayerRenderer::new(
                    self.sync.frame(),
                    events,
                    &recording.annotations,
                    self.sync.state().duration,
                    &self.settings.colors,
                );
                let output = renderer.render(ui);
                surface = output.surface;
                seek_to = output.seek_to;
            }
        });

        self.surface = surface;
        if let Some(offset) = seek_to {
            self.sync.seek(offset as i64);
        }
    }

    fn render_error_dialog(&mut self, ctx: &egui::Context) {
        let action = ErrorDialogRenderer::new(&mut self.error_dialog).render(ctx);
        if let Some(ErrorDialogAction::Retry(path)) = action {
            self.load_file(path);
        }
    }

    /// Render the placeholder view when no recording is loaded.
    fn render_no_file_placeholder(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("📁 No Recording Loaded");
            ui.add_space(10.0);
            ui.label("Drag and drop a session recording (.srj) to get started.");
            ui.label("Or use the \"Open\" button in the toolbar.");
        });
    }

    /// Render the loading placeholder view.
    fn render_loading_placeholder(&self, ui: &mut egui::Ui) {
        let name = self
            .loader
            .as_ref()
            .and_then(|l| l.current_path())
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.heading("⏳ Loading...");
            ui.add_space(10.0);
            ui.label(name);
            ui.add_space(20.0);
            ui.spinner();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolbar_enabled_only_when_ready() {
        assert!(!AppState::NoFileLoaded.toolbar_enabled());
        assert!(!AppState::Loading.toolbar_enabled());
        assert!(AppState::Ready.toolbar_enabled());
    }

    #[test]
    fn test_status_message_visible_when_new() {
        let msg = StatusMessage::new("Loaded", StatusKind::Success);
        assert!(msg.is_visible());
        assert_eq!(msg.kind, StatusKind::Success);
    }
}
