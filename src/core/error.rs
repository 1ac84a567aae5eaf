//! Errors shown to the user.
//!
//! Every failure that reaches the error dialog is an [`AppError`]. Its
//! `Display` text is the one-line summary; [`AppError::facts`] lists the
//! labelled values behind it.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::parser::{ParseError, SUPPORTED_VERSION};

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("'{}' does not exist.", file_name(.path))]
    FileNotFound { path: PathBuf },

    #[error("'{}' could not be read: {reason}", file_name(.path))]
    FileReadError { path: PathBuf, reason: String },

    /// The file is not a well-formed recording.
    #[error("{message}")]
    InvalidFormat {
        path: Option<PathBuf>,
        message: String,
        /// 1-based line and column of a JSON syntax error
        position: Option<(usize, usize)>,
    },

    #[error(
        "Recording format version {found} is not supported; this viewer reads version {}.",
        SUPPORTED_VERSION
    )]
    UnsupportedVersion { path: Option<PathBuf>, found: u32 },

    #[error("'{}' is not a session recording.", file_name(.path))]
    UnsupportedFileType {
        path: PathBuf,
        expected: &'static [&'static str],
    },

    #[error("Loading '{}' gave up after {after:?}.", file_name(.path))]
    LoadTimeout { path: PathBuf, after: Duration },

    #[error("The background loader is unavailable: {reason}")]
    LoaderUnavailable { reason: String },

    #[error("Settings could not be saved: {reason}")]
    SettingsSaveError { reason: String },

    #[error("Settings could not be loaded: {reason}")]
    SettingsLoadError { reason: String },
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

impl AppError {
    /// Classify an I/O failure on `path`.
    pub fn from_io(path: PathBuf, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound { path },
            _ => Self::FileReadError {
                path,
                reason: error.to_string(),
            },
        }
    }

    /// Wrap a parser failure for the file at `path`.
    pub fn from_parse(path: Option<PathBuf>, error: ParseError) -> Self {
        let position = match &error {
            ParseError::JsonSyntax(e) if e.line() > 0 => Some((e.line(), e.column())),
            _ => None,
        };

        match error {
            ParseError::UnsupportedVersion { version } => Self::UnsupportedVersion {
                path,
                found: version,
            },
            other => Self::InvalidFormat {
                path,
                message: other.to_string(),
                position,
            },
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "File Not Found",
            Self::FileReadError { .. } => "Cannot Read File",
            Self::InvalidFormat { .. } => "Invalid Recording",
            Self::UnsupportedVersion { .. } => "Unsupported Version",
            Self::UnsupportedFileType { .. } => "Unsupported File Type",
            Self::LoadTimeout { .. } => "Load Timed Out",
            Self::LoaderUnavailable { .. } => "Loader Unavailable",
            Self::SettingsSaveError { .. } | Self::SettingsLoadError { .. } => "Settings Error",
        }
    }

    /// Whether loading the same file again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::FileReadError { .. } | Self::LoadTimeout { .. }
        )
    }

    /// The recording file involved, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound { path }
            | Self::FileReadError { path, .. }
            | Self::UnsupportedFileType { path, .. }
            | Self::LoadTimeout { path, .. } => Some(path),
            Self::InvalidFormat { path, .. } | Self::UnsupportedVersion { path, .. } => {
                path.as_deref()
            }
            Self::LoaderUnavailable { .. }
            | Self::SettingsSaveError { .. }
            | Self::SettingsLoadError { .. } => None,
        }
    }

    /// Labelled values for the details pane.
    pub fn facts(&self) -> Vec<(&'static str, String)> {
        let mut facts = Vec::new();
        if let Some(path) = self.path() {
            facts.push(("File", path.display().to_string()));
        }

        match self {
            Self::FileReadError { reason, .. }
            | Self::LoaderUnavailable { reason }
            | Self::SettingsSaveError { reason }
            | Self::SettingsLoadError { reason } => facts.push(("Reason", reason.clone())),
            Self::InvalidFormat {
                position: Some((line, column)),
                ..
            } => {
                facts.push(("Line", line.to_string()));
                facts.push(("Column", column.to_string()));
            }
            Self::UnsupportedVersion { found, .. } => {
                facts.push(("Found version", found.to_string()));
                facts.push(("Supported version", SUPPORTED_VERSION.to_string()));
            }
            Self::UnsupportedFileType { expected, .. } => {
                let extensions: Vec<String> = expected.iter().map(|e| format!(".{}", e)).collect();
                facts.push(("Accepted extensions", extensions.join(", ")));
            }
            Self::LoadTimeout { after, .. } => facts.push(("Timeout", format!("{:?}", after))),
            Self::FileNotFound { .. } | Self::InvalidFormat { .. } => {}
        }

        facts
    }

    /// Plain-text report copied to the clipboard.
    pub fn report(&self) -> String {
        let mut report = format!("{}\n{}", self.title(), self);
        for (label, value) in self.facts() {
            report.push_str(&format!("\n{}: {}", label, value));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_json;

    fn fact<'a>(facts: &'a [(&'static str, String)], label: &str) -> Option<&'a str> {
        facts
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_summary_names_the_file() {
        let error = AppError::FileNotFound {
            path: PathBuf::from("/recordings/checkout.srj"),
        };
        assert_eq!(error.to_string(), "'checkout.srj' does not exist.");
        assert!(error.is_retryable());
        assert_eq!(error.path(), Some(Path::new("/recordings/checkout.srj")));
    }

    #[test]
    fn test_io_error_kinds() {
        let path = PathBuf::from("/recordings/checkout.srj");

        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            AppError::from_io(path.clone(), missing),
            AppError::FileNotFound { .. }
        ));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        match AppError::from_io(path.clone(), denied) {
            AppError::FileReadError { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("access denied"));
            }
            other => panic!("Expected FileReadError, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let parse_error = parse_json("{\n  \"version\": 1,\n  \"events\": [,]\n}").unwrap_err();
        let error = AppError::from_parse(None, parse_error);

        match &error {
            AppError::InvalidFormat {
                position: Some((line, _)),
                ..
            } => assert_eq!(*line, 3),
            other => panic!("Expected InvalidFormat with a position, got {:?}", other),
        }
        assert!(!error.is_retryable());
        assert_eq!(fact(&error.facts(), "Line"), Some("3"));
        assert!(fact(&error.facts(), "File").is_none());
    }

    #[test]
    fn test_semantic_error_has_no_position() {
        let json = r#"{ "version": 1, "events": [ { "type": 9, "timestamp": 0 } ] }"#;
        let parse_error = parse_json(json).unwrap_err();
        let error = AppError::from_parse(Some(PathBuf::from("bad.srj")), parse_error);

        match &error {
            AppError::InvalidFormat { position, message, .. } => {
                assert!(position.is_none());
                assert!(message.contains("type"));
            }
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
        assert_eq!(error.path(), Some(Path::new("bad.srj")));
    }

    #[test]
    fn test_version_error() {
        let parse_error = parse_json(r#"{ "version": 3, "events": [] }"#).unwrap_err();
        let error = AppError::from_parse(Some(PathBuf::from("old.srj")), parse_error);

        assert!(matches!(error, AppError::UnsupportedVersion { found: 3, .. }));
        assert_eq!(fact(&error.facts(), "Found version"), Some("3"));
        assert_eq!(
            fact(&error.facts(), "Supported version"),
            Some(SUPPORTED_VERSION.to_string().as_str())
        );
    }

    #[test]
    fn test_timeout_report() {
        let error = AppError::LoadTimeout {
            path: PathBuf::from("/recordings/huge.srj"),
            after: Duration::from_secs(30),
        };
        assert!(error.is_retryable());

        let report = error.report();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("Load Timed Out"));
        assert_eq!(lines.next(), Some("Loading 'huge.srj' gave up after 30s."));
        assert!(report.contains("File: /recordings/huge.srj"));
        assert!(report.contains("Timeout: 30s"));
    }

    #[test]
    fn test_unsupported_file_type_lists_extensions() {
        let error = AppError::UnsupportedFileType {
            path: PathBuf::from("notes.txt"),
            expected: &["srj", "json"],
        };
        assert_eq!(
            fact(&error.facts(), "Accepted extensions"),
            Some(".srj, .json")
        );
        assert!(!error.is_retryable());
    }
}
