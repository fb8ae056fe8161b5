//! Pipeline lifecycle events.
//!
//! Every run emits `pipeline.started` followed by exactly one of
//! `pipeline.completed`, `pipeline.timed_out` or `pipeline.failed`.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A lifecycle event for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The pipeline was wired and data is about to flow.
    Started {
        /// Run identifier.
        run_id: Uuid,
        /// Wall-clock start time.
        started_at: DateTime<Utc>,
        /// Stage names in execution order.
        stages: Vec<String>,
        /// Source description.
        source: String,
        /// Sink description.
        sink: String,
        /// Deadline for the whole run.
        timeout_ms: u64,
    },
    /// Every byte reached the sink and the sink was flushed.
    Completed {
        /// Run identifier.
        run_id: Uuid,
        /// Bytes read from the source.
        bytes_read: u64,
        /// Bytes written to the sink.
        bytes_written: u64,
        /// Run duration.
        duration_ms: f64,
    },
    /// The deadline elapsed and the pipeline was torn down.
    TimedOut {
        /// Run identifier.
        run_id: Uuid,
        /// Timeout reason.
        reason: String,
        /// Time until teardown.
        elapsed_ms: f64,
    },
    /// The pipeline stopped on an error.
    Failed {
        /// Run identifier.
        run_id: Uuid,
        /// Error payload from `CaseflowError::to_json`: `kind` and `message`.
        error: serde_json::Value,
    },
}

impl PipelineEvent {
    /// Returns the dotted event type.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "pipeline.started",
            Self::Completed { .. } => "pipeline.completed",
            Self::TimedOut { .. } => "pipeline.timed_out",
            Self::Failed { .. } => "pipeline.failed",
        }
    }

    /// Returns the run this event belongs to.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        match self {
            Self::Started { run_id, .. }
            | Self::Completed { run_id, .. }
            | Self::TimedOut { run_id, .. }
            | Self::Failed { run_id, .. } => *run_id,
        }
    }

    /// Returns true for events that end a run unsuccessfully.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::Failed { .. })
    }

    /// Converts to a JSON payload.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let run_id = Uuid::new_v4();
        let event = PipelineEvent::Completed {
            run_id,
            bytes_read: 6,
            bytes_written: 6,
            duration_ms: 1.5,
        };

        let json = event.to_json();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["bytes_written"], 6);
        assert_eq!(json["run_id"], run_id.to_string());
        assert_eq!(event.event_type(), "pipeline.completed");
        assert!(!event.is_failure());
    }

    #[test]
    fn test_failure_events() {
        let run_id = Uuid::new_v4();
        let event = PipelineEvent::TimedOut {
            run_id,
            reason: "Took too long!".into(),
            elapsed_ms: 100.0,
        };
        assert!(event.is_failure());
        assert_eq!(event.run_id(), run_id);
    }

    #[test]
    fn test_failed_event_nests_error_payload() {
        let err = crate::errors::CaseflowError::Decode("invalid gzip header".into());
        let event = PipelineEvent::Failed {
            run_id: Uuid::new_v4(),
            error: err.to_json(),
        };

        let json = event.to_json();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["error"]["kind"], "decode");
        assert_eq!(json["error"]["message"], "Invalid gzip input: invalid gzip header");
        assert!(event.is_failure());
    }
}
