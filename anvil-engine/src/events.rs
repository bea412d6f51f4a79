//! Build and push event streams
//!
//! The engine reports build and push progress as JSON-lines streams. A
//! terminal failure can arrive on any line, including after lines that
//! reported normal progress, so callers must drain every line to the end of
//! the stream before declaring success.

use serde::Deserialize;

/// One line of an engine build or push stream
#[derive(Debug, Default, Deserialize)]
pub struct StreamEvent {
    /// Build log fragment
    #[serde(default)]
    pub stream: Option<String>,
    /// Push progress status line
    #[serde(default)]
    pub status: Option<String>,
    /// Top-level error message (older engines)
    #[serde(default)]
    pub error: Option<String>,
    /// Structured error detail
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
}

/// Structured error carried inside a stream event
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

impl StreamEvent {
    /// Parses a single stream line; non-JSON lines are skipped
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    /// The error message this event encodes, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error_detail
            .as_ref()
            .and_then(|detail| detail.message.as_deref())
            .or(self.error.as_deref())
    }

    /// Whether the error message matches the registry's access-denied pattern
    pub fn is_access_denied(&self) -> bool {
        self.error_message()
            .map(|message| {
                let lower = message.to_ascii_lowercase();
                lower.contains("denied") || lower.contains("unauthorized")
            })
            .unwrap_or(false)
    }
}

/// Accumulates the terminal outcome of a push event stream
///
/// Feed every event from the stream, then convert to a result once the
/// stream has ended. A denial anywhere in the stream outranks other errors;
/// the first error of each kind is kept.
#[derive(Debug, Default)]
pub struct PushOutcome {
    denied: Option<String>,
    failure: Option<String>,
}

impl PushOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one stream event
    pub fn observe(&mut self, event: &StreamEvent) {
        if let Some(message) = event.error_message() {
            if event.is_access_denied() {
                if self.denied.is_none() {
                    self.denied = Some(message.to_string());
                }
            } else if self.failure.is_none() {
                self.failure = Some(message.to_string());
            }
        }
    }

    /// The stream's terminal verdict, valid only after end-of-stream
    pub fn into_result(self) -> Result<(), crate::error::EngineError> {
        if let Some(message) = self.denied {
            return Err(crate::error::EngineError::AuthorizationDenied(message));
        }
        if let Some(message) = self.failure {
            return Err(crate::error::EngineError::Publish(message));
        }
        Ok(())
    }
}

/// Accumulates the terminal outcome of a build event stream
///
/// The build stream only fails on the engine's own error event; log lines
/// are not scanned for per-step failure markers.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    failure: Option<String>,
}

impl BuildOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one stream event
    pub fn observe(&mut self, event: &StreamEvent) {
        if self.failure.is_none() {
            if let Some(message) = event.error_message() {
                self.failure = Some(message.to_string());
            }
        }
    }

    /// The stream's terminal verdict, valid only after end-of-stream
    pub fn into_result(self) -> Result<(), crate::error::EngineError> {
        match self.failure {
            Some(message) => Err(crate::error::EngineError::Build(message)),
            None => Ok(()),
        }
    }
}

/// Splits streamed chunks into complete lines
///
/// Chunk boundaries do not align with line boundaries, or even with UTF-8
/// character boundaries, so raw bytes are buffered and only converted to
/// text once a full line has arrived. [`LineScanner::finish`] flushes
/// whatever remains when the stream ends.
#[derive(Debug, Default)]
pub struct LineScanner {
    buffer: Vec<u8>,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every complete line it closed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    /// Flushes the trailing unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            let line = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            Some(line)
        }
    }
}
