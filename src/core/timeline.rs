//! Zero-based playback timeline.
//!
//! Rebases a captured event stream so that its first event sits at offset 0.
//! Rebasing is a pure shift: event order is never changed.

use std::sync::Arc;

use thiserror::Error;

use super::recording::{CapturedEvent, EventKind};

/// Reasons a captured event stream cannot be turned into a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The stream has no events (e.g. the recording is still uploading)
    #[error("recording has no events")]
    Empty,

    /// An event is earlier than the one before it
    #[error("event {index} at {timestamp} precedes the previous event at {previous}")]
    OutOfOrder {
        index: usize,
        timestamp: u64,
        previous: u64,
    },
}

/// A captured event rebased onto the playback clock.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedEvent {
    /// Milliseconds since the first event of the recording
    pub offset: u64,
    pub kind: EventKind,
    pub data: serde_json::Value,
}

/// Normalized event stream.
#[derive(Clone, Debug)]
pub struct Timeline {
    events: Arc<[NormalizedEvent]>,
}

impl Timeline {
    /// Rebase `source` so the first event is at offset 0.
    pub fn normalize(source: &[CapturedEvent]) -> Result<Self, TimelineError> {
        let first = source.first().ok_or(TimelineError::Empty)?.timestamp;

        if let Some(index) = source
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(TimelineError::OutOfOrder {
                index: index + 1,
                timestamp: source[index + 1].timestamp,
                previous: source[index].timestamp,
            });
        }

        let events: Arc<[NormalizedEvent]> = source
            .iter()
            .map(|event| NormalizedEvent {
                offset: event.timestamp - first,
                kind: event.kind,
                data: event.data.clone(),
            })
            .collect();

        Ok(Self { events })
    }

    pub fn events(&self) -> &Arc<[NormalizedEvent]> {
        &self.events
    }

    /// Offset of the last event.
    pub fn duration(&self) -> u64 {
        self.events.last().map_or(0, |event| event.offset)
    }
}
