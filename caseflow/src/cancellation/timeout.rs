//! Deadline-bound cancellation.

use super::CancellationToken;
use crate::errors::{CaseflowError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Reason recorded on the token when the deadline elapses.
pub const TIMEOUT_REASON: &str = "Took too long!";

/// Deadlines beyond this horizon are clamped to it.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// A single-use cancellation signal with a deadline.
///
/// The token fires either when the deadline elapses or when it is
/// cancelled explicitly. Firing is terminal. Errors produced after firing
/// distinguish the two causes: [`CaseflowError::Timeout`] for the deadline
/// and [`CaseflowError::Cancelled`] for an explicit cancel.
#[derive(Debug)]
pub struct TimeoutToken {
    token: CancellationToken,
    timeout: Duration,
    deadline: Instant,
    reason: String,
    timed_out: AtomicBool,
}

impl TimeoutToken {
    /// Creates a token whose deadline is `timeout` from now.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_reason(timeout, TIMEOUT_REASON)
    }

    /// Creates a token with a custom timeout reason.
    #[must_use]
    pub fn with_reason(timeout: Duration, reason: impl Into<String>) -> Self {
        Self {
            token: CancellationToken::new(),
            timeout,
            deadline: deadline_after(timeout),
            reason: reason.into(),
            timed_out: AtomicBool::new(false),
        }
    }

    /// Returns the underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true once the token has fired for any reason.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true if the token fired because the deadline elapsed.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Fires the token as a timeout. Returns false if it had already fired.
    pub fn fire(&self) -> bool {
        if self.token.cancel(self.reason.clone()) {
            self.timed_out.store(true, Ordering::SeqCst);
            let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            debug!(timeout_ms, "Deadline elapsed");
            true
        } else {
            false
        }
    }

    /// Cancels the token before its deadline.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        self.token.cancel(reason)
    }

    /// Resolves when the token fires, firing it as a timeout if the
    /// deadline is reached first.
    pub async fn expired(&self) {
        tokio::select! {
            () = tokio::time::sleep_until(self.deadline) => {
                self.fire();
            }
            () = self.token.cancelled() => {}
        }
    }

    /// Checks the token at a suspension point.
    ///
    /// Fires the token if the deadline has passed but nobody has noticed
    /// yet, so the check is accurate even when the timer task has not run.
    pub fn check(&self) -> Result<()> {
        if !self.is_fired() && Instant::now() >= self.deadline {
            self.fire();
        }
        if self.is_fired() {
            Err(self.error())
        } else {
            Ok(())
        }
    }

    /// Builds the error describing why the token fired.
    #[must_use]
    pub fn error(&self) -> CaseflowError {
        let reason = self.token.reason().unwrap_or_else(|| self.reason.clone());
        if self.timed_out() {
            CaseflowError::Timeout(reason)
        } else {
            CaseflowError::Cancelled(reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_passes_check() {
        let token = TimeoutToken::new(Duration::from_secs(60));
        assert!(token.check().is_ok());
        assert!(!token.is_fired());
    }

    #[test]
    fn test_fire_is_terminal() {
        let token = TimeoutToken::new(Duration::from_secs(60));
        assert!(token.fire());
        assert!(!token.fire());
        assert!(!token.cancel("later"));

        let err = token.check().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), TIMEOUT_REASON);
    }

    #[test]
    fn test_explicit_cancel_is_not_a_timeout() {
        let token = TimeoutToken::new(Duration::from_secs(60));
        token.cancel("shutting down");

        let err = token.check().unwrap_err();
        assert!(matches!(err, CaseflowError::Cancelled(ref r) if r == "shutting down"));
        assert!(!token.timed_out());
    }

    #[test]
    fn test_unbounded_timeout_fires_as_timeout() {
        let token = TimeoutToken::new(Duration::MAX);
        assert!(token.check().is_ok());
        assert!(token.fire());
        assert!(token.timed_out());
        assert!(token.check().unwrap_err().is_timeout());
    }

    #[test]
    fn test_check_fires_after_deadline() {
        let token = TimeoutToken::new(Duration::ZERO);
        let err = token.check().unwrap_err();
        assert!(err.is_timeout());
        assert!(token.timed_out());
    }

    #[tokio::test]
    async fn test_expired_fires_at_deadline() {
        let token = TimeoutToken::with_reason(Duration::from_millis(20), "too slow");
        tokio::time::timeout(Duration::from_secs(1), token.expired())
            .await
            .expect("deadline should elapse");

        assert!(token.timed_out());
        assert_eq!(token.error().to_string(), "too slow");
    }

    #[tokio::test]
    async fn test_expired_resolves_on_cancel() {
        let token = TimeoutToken::new(Duration::from_secs(60));
        token.cancel("stop");
        tokio::time::timeout(Duration::from_millis(100), token.expired())
            .await
            .expect("cancel should resolve immediately");
        assert!(!token.timed_out());
    }
}
