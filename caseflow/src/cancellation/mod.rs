//! Structured cancellation and cleanup utilities.
//!
//! This module provides:
//! - CancellationToken for cooperative, terminal cancellation
//! - TimeoutToken binding a token to a deadline
//! - CleanupGuard and HandleTracker for scoped handle release

mod cleanup;
mod timeout;
mod token;

pub use cleanup::{CleanupGuard, HandleTracker};
pub use timeout::{TimeoutToken, TIMEOUT_REASON};
pub use token::{CancelCallback, CancellationToken};
