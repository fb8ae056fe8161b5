//! Error types for caseflow.
//!
//! Every failure is terminal for the run: nothing here is retried. The
//! binary maps any error to exit code 1 and additionally prints the help
//! text for [`CaseflowError::Usage`].

use serde_json::json;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, CaseflowError>;

/// The main error type for caseflow operations.
#[derive(Debug, Error)]
pub enum CaseflowError {
    /// Missing or invalid command-line usage.
    #[error("{0}")]
    Usage(String),

    /// A source or sink could not be opened, read or written.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted (e.g. "cannot open input /tmp/in.txt").
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The input was not valid gzip framing.
    #[error("Invalid gzip input: {0}")]
    Decode(String),

    /// The pipeline did not finish before its deadline.
    #[error("{0}")]
    Timeout(String),

    /// The pipeline was cancelled before its deadline.
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),

    /// Stages were added to a pipeline out of order.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),
}

impl CaseflowError {
    /// Wraps an I/O error with a description of the failed operation.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates a usage error.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Returns true if the help text should accompany this error.
    #[must_use]
    pub const fn shows_help(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Returns true if the run was stopped by its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Short machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Io { .. } => "io",
            Self::Decode(_) => "decode",
            Self::Timeout(_) => "timeout",
            Self::Cancelled(_) => "cancelled",
            Self::InvalidPipeline(_) => "invalid_pipeline",
        }
    }

    /// Converts to a JSON payload for event sinks.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "kind": self.kind(),
            "message": self.to_string(),
        })
    }
}

impl From<std::io::Error> for CaseflowError {
    fn from(err: std::io::Error) -> Self {
        Self::io("I/O error", err)
    }
}
