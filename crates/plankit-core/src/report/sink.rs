//! Destinations for [`StructuredEvent`]s.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use super::StructuredEvent;

/// Receives structured events. Implementations swallow their own transport
/// failures (logging them) instead of returning errors.
pub trait StructuredSink: Send + Sync {
    fn send(&self, event: &StructuredEvent);
}

/// Emits each event as a `tracing` record on the `plankit::structured`
/// target, with the event serialized as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl StructuredSink for LogSink {
    fn send(&self, event: &StructuredEvent) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(
                target: "plankit::structured",
                event_type = event.type_name(),
                event = %json,
                "structured event"
            ),
            Err(e) => tracing::warn!(error = %e, "failed to serialize structured event"),
        }
    }
}

/// Writes one JSON object per line to a writer.
pub struct JsonLinesSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Append to `path`, creating it if needed.
    pub fn append_to(path: &std::path::Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl StructuredSink for JsonLinesSink {
    fn send(&self, event: &StructuredEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize structured event");
                return;
            }
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(error = %e, event_type = event.type_name(), "failed to write structured event");
        }
    }
}

impl fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StructuredEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first.
    pub fn events(&self) -> Vec<StructuredEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StructuredSink for MemorySink {
    fn send(&self, event: &StructuredEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Where structured events go: `log`, `stderr`, or any other value as a
/// file path to append JSON lines to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Log,
    Stderr,
    File(PathBuf),
}

impl SinkConfig {
    pub const DEFAULT: &str = "log";
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Log
    }
}

impl fmt::Display for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Stderr => f.write_str("stderr"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for SinkConfig {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "report sink must not be empty",
            )),
            "log" => Ok(Self::Log),
            "stderr" => Ok(Self::Stderr),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

/// Build the sink described by `config`.
pub fn open_sink(config: &SinkConfig) -> io::Result<Arc<dyn StructuredSink>> {
    Ok(match config {
        SinkConfig::Log => Arc::new(LogSink),
        SinkConfig::Stderr => Arc::new(JsonLinesSink::stderr()),
        SinkConfig::File(path) => Arc::new(JsonLinesSink::append_to(path)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FailureReport;

    fn event(summary: &str) -> StructuredEvent {
        StructuredEvent::FailureReport(FailureReport {
            timestamp: "2026-03-01T12:00:00.000000Z".to_owned(),
            summary: summary.to_owned(),
            requirements: None,
            problems: None,
            solutions: None,
            source_agent: None,
        })
    }

    #[test]
    fn sink_config_parsing() {
        assert_eq!("log".parse::<SinkConfig>().unwrap(), SinkConfig::Log);
        assert_eq!("stderr".parse::<SinkConfig>().unwrap(), SinkConfig::Stderr);
        assert_eq!(
            "/var/log/plankit.jsonl".parse::<SinkConfig>().unwrap(),
            SinkConfig::File(PathBuf::from("/var/log/plankit.jsonl"))
        );
        assert!("  ".parse::<SinkConfig>().is_err());
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let sink = open_sink(&SinkConfig::File(path.clone())).unwrap();
        sink.send(&event("one"));
        sink.send(&event("two"));
        drop(sink);

        // Reopening appends rather than truncating.
        let sink = open_sink(&SinkConfig::File(path.clone())).unwrap();
        sink.send(&event("three"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["summary"], "one");
        assert_eq!(lines[2]["summary"], "three");
        assert_eq!(lines[1]["type"], "failure_report");
    }

    #[test]
    fn log_sink_does_not_panic_without_subscriber() {
        LogSink.send(&event("quiet"));
    }
}
