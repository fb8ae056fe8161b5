//! Per-run execution context.
//!
//! A [`RunContext`] is created once per invocation and passed by reference
//! through every stage boundary. It carries the run's timeout token, the
//! handle tracker used to prove that teardown released every descriptor,
//! and the event sink.

use crate::cancellation::{CleanupGuard, HandleTracker, TimeoutToken};
use crate::errors::{CaseflowError, Result};
use crate::events::{EventSink, NoOpEventSink};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The context for a single pipeline run.
pub struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    timeout: TimeoutToken,
    handles: HandleTracker,
    event_sink: Arc<dyn EventSink>,
}

impl RunContext {
    /// Creates a context whose deadline is `timeout` from now.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_token(TimeoutToken::new(timeout))
    }

    /// Creates a context around an existing timeout token.
    #[must_use]
    pub fn with_token(timeout: TimeoutToken) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            timeout,
            handles: HandleTracker::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the run ID.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns when the run started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the timeout token.
    #[must_use]
    pub const fn timeout(&self) -> &TimeoutToken {
        &self.timeout
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Cancels the run before its deadline.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        self.timeout.cancel(reason)
    }

    /// Returns true once the run's token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.timeout.is_fired()
    }

    /// Checks for cancellation at an I/O suspension point.
    pub fn check(&self) -> Result<()> {
        self.timeout.check()
    }

    /// Returns the error describing why the run was stopped.
    #[must_use]
    pub fn cancellation_error(&self) -> CaseflowError {
        self.timeout.error()
    }

    /// Registers an open handle; dropping the guard releases it.
    #[must_use]
    pub fn track_handle(&self, label: impl Into<String>) -> CleanupGuard {
        self.handles.track(label)
    }

    /// Returns the number of handles opened for this run and not yet released.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.handles.open_count()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("timeout", &self.timeout)
            .field("open_handles", &self.open_handles())
            .finish_non_exhaustive()
    }
}
