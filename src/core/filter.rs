//! Log stream filtering.
//!
//! This module derives the console and network entries that are visible at
//! the current playback time, plus the panel-level toggles that hide
//! console severities or successful requests.

use super::recording::{ConsoleLevel, ConsoleLogEntry, NetworkLogEntry, Timestamped};

/// Entries whose timestamp is at or before `current_time`, in original order.
///
/// The input is never modified; this is recomputed whenever the playhead or
/// the log changes.
pub fn entries_until<T: Timestamped>(entries: &[T], current_time: u64) -> Vec<&T> {
    entries
        .iter()
        .filter(|entry| entry.timestamp() <= current_time)
        .collect()
}

/// Console severity groups that can be toggled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelGroup {
    /// `log`, `info` and `debug`
    Verbose,
    Warn,
    Error,
}

impl LevelGroup {
    pub fn of(level: ConsoleLevel) -> Self {
        match level {
            ConsoleLevel::Log | ConsoleLevel::Info | ConsoleLevel::Debug => Self::Verbose,
            ConsoleLevel::Warn => Self::Warn,
            ConsoleLevel::Error => Self::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Verbose => "Verbose",
            Self::Warn => "Warnings",
            Self::Error => "Errors",
        }
    }
}

/// Filter state for the console and network panels.
#[derive(Debug, Clone)]
pub struct LogFilterState {
    /// Whether to show log/info/debug messages
    pub show_verbose: bool,
    /// Whether to show warnings
    pub show_warn: bool,
    /// Whether to show errors
    pub show_error: bool,
    /// Whether the network panel lists failed requests only
    pub failed_requests_only: bool,
}

impl Default for LogFilterState {
    fn default() -> Self {
        Self {
            show_verbose: true,
            show_warn: true,
            show_error: true,
            failed_requests_only: false,
        }
    }
}

impl LogFilterState {
    /// Create a new filter state with default settings (all visible).
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every toggle to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_group_visible(&self, group: LevelGroup) -> bool {
        match group {
            LevelGroup::Verbose => self.show_verbose,
            LevelGroup::Warn => self.show_warn,
            LevelGroup::Error => self.show_error,
        }
    }

    /// Check if a console level passes the severity toggles.
    pub fn is_level_visible(&self, level: ConsoleLevel) -> bool {
        self.is_group_visible(LevelGroup::of(level))
    }

    /// Count how many severity groups are currently enabled.
    pub fn enabled_group_count(&self) -> u32 {
        [self.show_verbose, self.show_warn, self.show_error]
            .iter()
            .filter(|&&enabled| enabled)
            .count() as u32
    }

    /// Check if a severity group can be disabled.
    /// Returns false if this is the last enabled group (to prevent an empty panel).
    pub fn can_disable_group(&self, group: LevelGroup) -> bool {
        !self.is_group_visible(group) || self.enabled_group_count() > 1
    }

    /// Set the visibility of a severity group.
    /// Returns true if the change was applied, false if it would leave no group enabled.
    pub fn set_group_visible(&mut self, group: LevelGroup, visible: bool) -> bool {
        if !visible && !self.can_disable_group(group) {
            return false;
        }

        match group {
            LevelGroup::Verbose => self.show_verbose = visible,
            LevelGroup::Warn => self.show_warn = visible,
            LevelGroup::Error => self.show_error = visible,
        }
        true
    }

    /// Console entries visible at `current_time` under the severity toggles.
    pub fn visible_console<'a>(
        &self,
        entries: &'a [ConsoleLogEntry],
        current_time: u64,
    ) -> Vec<&'a ConsoleLogEntry> {
        entries_until(entries, current_time)
            .into_iter()
            .filter(|entry| self.is_level_visible(entry.level))
            .collect()
    }

    /// Network entries visible at `current_time`.
    pub fn visible_network<'a>(
        &self,
        entries: &'a [NetworkLogEntry],
        current_time: u64,
    ) -> Vec<&'a NetworkLogEntry> {
        entries_until(entries, current_time)
            .into_iter()
            .filter(|entry| !self.failed_requests_only || entry.is_failed())
            .collect()
    }
}
