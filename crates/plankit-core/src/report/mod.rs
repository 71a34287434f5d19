//! Structured reports sent to a logging/telemetry sink.
//!
//! Reports travel on a side channel: they never change the result of the
//! call that emits them, and emitting one never fails.

pub mod sink;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub use sink::{JsonLinesSink, LogSink, MemorySink, SinkConfig, StructuredSink, open_sink};

/// A tagged record accepted by a [`StructuredSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredEvent {
    FailureReport(FailureReport),
}

impl StructuredEvent {
    /// The `type` tag as serialized.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::FailureReport(_) => "failure_report",
        }
    }
}

/// An agent's account of why it could not finish a piece of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    /// ISO-8601 time the report was emitted, captured by the sender.
    pub timestamp: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solutions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent: Option<String>,
}

/// Optional parts of a failure report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureDetails {
    pub requirements: Option<String>,
    pub problems: Option<String>,
    pub solutions: Option<String>,
    pub source_agent: Option<String>,
}

/// Stamp and emit a `failure_report` event, returning what was sent.
pub fn send_failure_report(
    sink: &dyn StructuredSink,
    summary: &str,
    details: FailureDetails,
) -> FailureReport {
    let report = FailureReport {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        summary: summary.to_owned(),
        requirements: details.requirements,
        problems: details.problems,
        solutions: details.solutions,
        source_agent: details.source_agent,
    };
    sink.send(&StructuredEvent::FailureReport(report.clone()));
    report
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::DateTime;

    use super::*;

    #[test]
    fn bare_report_has_no_optional_fields() {
        let sink = MemorySink::new();
        let report = send_failure_report(&sink, "x", FailureDetails::default());

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], StructuredEvent::FailureReport(report.clone()));

        let json = serde_json::to_value(&events[0]).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["type"], "failure_report");
        assert_eq!(obj["summary"], "x");
        for absent in ["requirements", "problems", "solutions", "sourceAgent"] {
            assert!(!obj.contains_key(absent), "{absent} should be absent: {json}");
        }
        assert!(DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn timestamps_are_captured_per_call() {
        let sink = MemorySink::new();
        let first = send_failure_report(&sink, "x", FailureDetails::default());
        std::thread::sleep(Duration::from_millis(5));
        let second = send_failure_report(&sink, "x", FailureDetails::default());
        assert_ne!(first.timestamp, second.timestamp);
    }

    #[test]
    fn details_use_camel_case_keys() {
        let sink = MemorySink::new();
        send_failure_report(
            &sink,
            "build broke",
            FailureDetails {
                requirements: Some("green build".to_owned()),
                problems: Some("linker error".to_owned()),
                solutions: Some("pin the toolchain".to_owned()),
                source_agent: Some("implementer".to_owned()),
            },
        );

        let json = serde_json::to_value(&sink.events()[0]).unwrap();
        assert_eq!(json["sourceAgent"], "implementer");
        assert_eq!(json["problems"], "linker error");

        let back: StructuredEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.type_name(), "failure_report");
    }
}
