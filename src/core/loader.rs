//! Background recording loader.
//!
//! Reading and parsing a large recording can take a noticeable amount of
//! time, so the GUI hands paths to a worker thread through a
//! [`MessageBroker`] and picks the results up on later frames.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::bridge::{self, BrokerError, Completion, MessageBroker, RequestId};
use super::error::AppError;
use super::parser::{FILE_EXTENSION, parse_json};
use super::recording::Recording;

/// How long a single load may take before it is reported as timed out.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads waiting on the worker at once.
const MAX_PENDING_LOADS: usize = 4;

/// Extensions accepted by [`load_recording`].
pub const ACCEPTED_EXTENSIONS: &[&str] = &[FILE_EXTENSION, "json"];

type LoadResponse = Result<Recording, AppError>;

/// Check the extension, read and parse a recording file.
pub fn load_recording(path: &Path) -> Result<Recording, AppError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let accepted = extension
        .as_deref()
        .is_some_and(|e| ACCEPTED_EXTENSIONS.contains(&e));
    if !accepted {
        return Err(AppError::UnsupportedFileType {
            path: path.to_path_buf(),
            expected: ACCEPTED_EXTENSIONS,
        });
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| AppError::from_io(path.to_path_buf(), e))?;

    parse_json(&content).map_err(|e| AppError::from_parse(Some(path.to_path_buf()), e))
}

/// A finished load, successful or not.
#[derive(Debug)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub result: Result<Recording, AppError>,
}

/// Runs [`load_recording`] on a worker thread.
///
/// Only the most recent request is of interest: issuing a new one abandons
/// whatever was in flight.
pub struct RecordingLoader {
    broker: MessageBroker<PathBuf, LoadResponse>,
    current: Option<(RequestId, PathBuf)>,
}

impl RecordingLoader {
    /// Spawn the worker thread.
    pub fn spawn() -> Result<Self, AppError> {
        Self::with_timeout(LOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let (broker, endpoint) =
            bridge::channel::<PathBuf, LoadResponse>(MAX_PENDING_LOADS, timeout);

        thread::Builder::new()
            .name("recording-loader".to_string())
            .spawn(move || {
                while let Some(request) = endpoint.recv() {
                    log::debug!("loading {}", request.body.display());
                    let result = load_recording(&request.body);
                    if endpoint.respond(request.id, result).is_err() {
                        break;
                    }
                }
                log::debug!("recording loader stopped");
            })
            .map_err(|e| AppError::LoaderUnavailable {
                reason: format!("Could not start the loader thread: {}", e),
            })?;

        Ok(Self {
            broker,
            current: None,
        })
    }

    /// Queue `path` for loading, abandoning any load still in flight.
    pub fn request(&mut self, path: PathBuf, now: Instant) -> Result<(), AppError> {
        if let Some((id, previous)) = self.current.take() {
            if self.broker.cancel(id) {
                log::info!("abandoning load of {}", previous.display());
            }
        }

        let id = self
            .broker
            .send(path.clone(), now)
            .map_err(|e| match e {
                BrokerError::TooManyPending { limit } => AppError::LoaderUnavailable {
                    reason: format!("Too many loads in progress (limit {})", limit),
                },
                BrokerError::Disconnected => AppError::LoaderUnavailable {
                    reason: "The loader thread has stopped".to_string(),
                },
            })?;

        log::debug!(
            "queued {} ({} load(s) pending)",
            path.display(),
            self.broker.pending_count()
        );
        self.current = Some((id, path));
        Ok(())
    }

    /// Whether a load is in flight and has not expired.
    pub fn is_busy(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(id, _)| self.broker.is_pending(*id))
    }

    /// Path of the load in flight.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|(_, path)| path.as_path())
    }

    /// Collect the outcome of the current load, if it finished or expired.
    ///
    /// Completions of abandoned loads are discarded.
    pub fn poll(&mut self, now: Instant) -> Option<LoadOutcome> {
        let mut outcome = None;

        for completion in self.broker.poll(now) {
            let id = match &completion {
                Completion::Resolved { id, .. } | Completion::TimedOut { id } => *id,
            };
            let Some((_, path)) = self.current.take_if(|(current, _)| *current == id) else {
                continue;
            };

            let result = match completion {
                Completion::Resolved { response, .. } => response,
                Completion::TimedOut { .. } => {
                    log::warn!("load of {} timed out", path.display());
                    Err(AppError::LoadTimeout {
                        path: path.clone(),
                        after: self.broker.timeout(),
                    })
                }
            };
            outcome = Some(LoadOutcome { path, result });
        }

        outcome
    }
}
