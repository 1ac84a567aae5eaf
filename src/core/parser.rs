//! Reader for `.srj` session recordings.
//!
//! The file is deserialized into private `Json*` mirrors first, then checked
//! (version, enum tags, console text) while building the [`Recording`].

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::recording::{
    Annotation, CapturedEvent, ConsoleLevel, ConsoleLogEntry, EventKind, NetworkLogEntry,
    Recording, RecordingMetadata,
};

/// The only recording format version this parser understands.
pub const SUPPORTED_VERSION: u32 = 1;

/// File extension of recording files.
pub const FILE_EXTENSION: &str = "srj";

/// Why a recording file could not be turned into a [`Recording`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Not valid JSON: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    #[error("A required field is missing: {field}")]
    MissingField { field: &'static str },

    #[error("'{value}' is not a valid {field} (allowed: {expected})")]
    InvalidEnumValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Format version {version} is not supported")]
    UnsupportedVersion { version: u32 },
}

/// Top-level JSON structure for .srj files.
#[derive(Debug, Deserialize)]
struct JsonRecording {
    version: u32,
    #[serde(default)]
    metadata: JsonMetadata,
    events: Vec<JsonEvent>,
    #[serde(default)]
    console_logs: Vec<JsonConsoleEntry>,
    #[serde(default)]
    network_logs: Vec<JsonNetworkEntry>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

/// Metadata section in JSON format.
#[derive(Debug, Default, Deserialize)]
struct JsonMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Captured event in JSON format.
#[derive(Debug, Deserialize)]
struct JsonEvent {
    #[serde(rename = "type")]
    kind: u64,
    timestamp: u64,
    #[serde(default)]
    data: serde_json::Value,
}

/// Console entry in JSON format.
///
/// Capture plugins write either a preformatted `message` or the raw
/// console `args`.
#[derive(Debug, Deserialize)]
struct JsonConsoleEntry {
    timestamp: u64,
    level: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    args: Option<Vec<serde_json::Value>>,
}

/// Network entry in JSON format.
#[derive(Debug, Deserialize)]
struct JsonNetworkEntry {
    timestamp: u64,
    #[serde(default)]
    method: Option<String>,
    url: String,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    duration_ms: Option<u64>,
}

/// Parse the contents of a `.srj` file.
///
/// Event order is kept exactly as written; the synchronizer decides what to
/// do with streams that are not ordered by timestamp.
pub fn parse_json(content: &str) -> Result<Recording, ParseError> {
    let json: JsonRecording = serde_json::from_str(content)?;

    if json.version != SUPPORTED_VERSION {
        return Err(ParseError::UnsupportedVersion {
            version: json.version,
        });
    }

    let metadata = RecordingMetadata {
        version: json.version,
        title: json.metadata.title,
        url: json.metadata.url,
        created_at: json.metadata.created_at,
    };

    let events = json
        .events
        .into_iter()
        .map(convert_event)
        .collect::<Result<Vec<_>, _>>()?;

    let console_logs = json
        .console_logs
        .into_iter()
        .map(convert_console_entry)
        .collect::<Result<Vec<_>, _>>()?;

    let network_logs = json
        .network_logs
        .into_iter()
        .map(convert_network_entry)
        .collect();

    Ok(Recording {
        metadata,
        events: Arc::from(events),
        console_logs,
        network_logs,
        annotations: json.annotations,
    })
}

/// Convert a JSON event to a `CapturedEvent`.
fn convert_event(json: JsonEvent) -> Result<CapturedEvent, ParseError> {
    let kind = EventKind::from_tag(json.kind).ok_or_else(|| ParseError::InvalidEnumValue {
        field: "type",
        value: json.kind.to_string(),
        expected: "0-6",
    })?;

    Ok(CapturedEvent {
        timestamp: json.timestamp,
        kind,
        data: json.data,
    })
}

/// Convert a JSON console entry to a `ConsoleLogEntry`.
fn convert_console_entry(json: JsonConsoleEntry) -> Result<ConsoleLogEntry, ParseError> {
    let level = ConsoleLevel::from_name(&json.level).ok_or_else(|| {
        ParseError::InvalidEnumValue {
            field: "level",
            value: json.level.clone(),
            expected: "log, info, debug, warn, error",
        }
    })?;

    let message = match (json.message, json.args) {
        (Some(message), _) => message,
        (None, Some(args)) => format_console_args(&args),
        (None, None) => {
            return Err(ParseError::MissingField {
                field: "message (or args)",
            });
        }
    };

    Ok(ConsoleLogEntry {
        timestamp: json.timestamp,
        level,
        message,
    })
}

/// Convert a JSON network entry to a `NetworkLogEntry`.
fn convert_network_entry(json: JsonNetworkEntry) -> NetworkLogEntry {
    NetworkLogEntry {
        timestamp: json.timestamp,
        method: json
            .method
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| "GET".to_string()),
        url: json.url,
        status: json.status,
        duration_ms: json.duration_ms,
    }
}

/// Join raw console arguments the way a browser console prints them.
fn format_console_args(args: &[serde_json::Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
