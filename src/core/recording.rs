//! Session recording data structures.
//!
//! This module defines the core data structures for a captured session:
//! the DOM/interaction event stream, console and network logs, annotations,
//! and recording metadata.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Kind of a captured DOM/interaction event.
///
/// Discriminants match the numeric `type` tag written by the capture pipeline.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Document finished parsing
    DomContentLoaded = 0,
    /// Page load completed
    Load = 1,
    /// Complete serialized DOM tree
    FullSnapshot = 2,
    /// Mutation, input, scroll or pointer patch on top of a snapshot
    IncrementalSnapshot = 3,
    /// Page metadata (href, viewport size)
    Meta = 4,
    /// Application-defined event
    Custom = 5,
    /// Event emitted by a capture plugin
    Plugin = 6,
}

impl EventKind {
    /// Map a numeric `type` tag to an event kind.
    pub fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            0 => Some(Self::DomContentLoaded),
            1 => Some(Self::Load),
            2 => Some(Self::FullSnapshot),
            3 => Some(Self::IncrementalSnapshot),
            4 => Some(Self::Meta),
            5 => Some(Self::Custom),
            6 => Some(Self::Plugin),
            _ => None,
        }
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::DomContentLoaded => "DOM content loaded",
            Self::Load => "Load",
            Self::FullSnapshot => "Full snapshot",
            Self::IncrementalSnapshot => "Incremental",
            Self::Meta => "Meta",
            Self::Custom => "Custom",
            Self::Plugin => "Plugin",
        }
    }
}

/// One captured DOM snapshot or incremental patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// Absolute wall-clock time in milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Event classification
    pub kind: EventKind,
    /// Payload, interpreted only by the replay engine
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Severity of a captured console message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Debug,
    Warn,
    Error,
}

impl ConsoleLevel {
    /// Parse a level name as written by the capture pipeline.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "log" => Some(Self::Log),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// A console message captured during recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLogEntry {
    /// Recording-relative time in milliseconds
    pub timestamp: u64,
    /// Console method that produced the message
    pub level: ConsoleLevel,
    /// Formatted message text
    pub message: String,
}

/// A network request captured during recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkLogEntry {
    /// Recording-relative time in milliseconds
    pub timestamp: u64,
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Response status, absent when the request never completed
    #[serde(default)]
    pub status: Option<u16>,
    /// Round-trip time in milliseconds
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl NetworkLogEntry {
    /// A request failed if it never completed or returned a 4xx/5xx status.
    pub fn is_failed(&self) -> bool {
        self.status.is_none_or(|status| status >= 400)
    }
}

/// A reviewer note pinned to a point in the recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Recording-relative time in milliseconds
    pub timestamp: u64,
    /// Note text
    pub text: String,
}

/// Anything that sits at a recording-relative point in time.
pub trait Timestamped {
    fn timestamp(&self) -> u64;
}

impl Timestamped for ConsoleLogEntry {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Timestamped for NetworkLogEntry {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Timestamped for Annotation {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Metadata about the recording.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Format version
    pub version: u32,
    /// Title given to the recording
    #[serde(default)]
    pub title: Option<String>,
    /// Page URL where recording started
    #[serde(default)]
    pub url: Option<String>,
    /// Timestamp when the recording was created
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Default for RecordingMetadata {
    fn default() -> Self {
        Self {
            version: 1,
            title: None,
            url: None,
            created_at: None,
        }
    }
}

/// Complete session recording.
///
/// `events` is shared so the synchronizer can detect when the same event
/// stream is handed to it again.
#[derive(Clone, Debug)]
pub struct Recording {
    pub metadata: RecordingMetadata,
    pub events: Arc<[CapturedEvent]>,
    pub console_logs: Vec<ConsoleLogEntry>,
    pub network_logs: Vec<NetworkLogEntry>,
    pub annotations: Vec<Annotation>,
}

impl Default for Recording {
    fn default() -> Self {
        Self {
            metadata: RecordingMetadata::default(),
            events: Arc::from(Vec::new()),
            console_logs: Vec::new(),
            network_logs: Vec::new(),
            annotations: Vec::new(),
        }
    }
}
