//! Playback state and trim range.
//!
//! This module provides the published playback snapshot (current time,
//! duration, play state), the trim range that bounds playback, and the
//! speed limits and presets shared by the synchronizer and the controls.

/// Default playback speed (1.0 = real time).
pub const DEFAULT_SPEED: f32 = 1.0;

/// Minimum allowed playback speed.
pub const MIN_SPEED: f32 = 0.1;

/// Maximum allowed playback speed.
pub const MAX_SPEED: f32 = 10.0;

/// Available speed presets for the UI.
pub const SPEED_OPTIONS: &[f32] = &[0.25, 0.5, 1.0, 2.0, 4.0];

/// Clamp a requested speed multiplier into the supported range.
///
/// Zero and negative multipliers become [`MIN_SPEED`]; NaN and infinities
/// fall back to [`DEFAULT_SPEED`].
pub fn clamp_speed(speed: f32) -> f32 {
    if speed.is_finite() {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    } else {
        DEFAULT_SPEED
    }
}

/// Get the next speed preset above `speed`.
///
/// Speeds at or above the highest preset are returned unchanged.
pub fn next_speed_preset(speed: f32) -> f32 {
    SPEED_OPTIONS
        .iter()
        .copied()
        .find(|&preset| preset > speed)
        .unwrap_or(speed)
}

/// Get the next speed preset below `speed`.
///
/// Speeds at or below the lowest preset are returned unchanged.
pub fn prev_speed_preset(speed: f32) -> f32 {
    SPEED_OPTIONS
        .iter()
        .rev()
        .copied()
        .find(|&preset| preset < speed)
        .unwrap_or(speed)
}

/// Playback position as seen by every view.
///
/// `current_time` never exceeds `duration`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Playhead position in milliseconds.
    pub current_time: u64,
    /// Offset of the last event in milliseconds.
    pub duration: u64,
    /// Whether the engine is running.
    pub is_playing: bool,
}

impl PlaybackState {
    /// Playhead position as a fraction of the duration (0.0 when empty).
    pub fn progress(&self) -> f32 {
        if self.duration == 0 {
            0.0
        } else {
            (self.current_time as f64 / self.duration as f64) as f32
        }
    }
}

/// Sub-interval of the recording that playback is confined to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimRange {
    pub start: u64,
    pub end: u64,
}

impl TrimRange {
    /// The untrimmed range `[0, duration]`.
    pub fn full(duration: u64) -> Self {
        Self {
            start: 0,
            end: duration,
        }
    }

    /// Build a valid range for `duration` from arbitrary handle positions.
    ///
    /// Both ends are clamped into `[0, duration]`; a start past the end is
    /// pulled back to the end.
    pub fn new(start: u64, end: u64, duration: u64) -> Self {
        let end = end.min(duration);
        Self {
            start: start.min(end),
            end,
        }
    }

    /// Whether this range differs from `[0, duration]`.
    pub fn is_trimmed(&self, duration: u64) -> bool {
        *self != Self::full(duration)
    }

    /// Clamp a (possibly negative) offset into the range.
    pub fn clamp(&self, offset: i64) -> u64 {
        if offset <= 0 {
            self.start
        } else {
            (offset as u64).clamp(self.start, self.end)
        }
    }

    pub fn contains(&self, offset: u64) -> bool {
        (self.start..=self.end).contains(&offset)
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }
}

/// Format milliseconds as `mm:ss.mmm`.
pub fn format_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}
