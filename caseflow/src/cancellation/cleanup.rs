//! Scoped release of pipeline resources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Guard that runs cleanup when dropped.
///
/// Drop runs on every exit path of the owning value, including the path
/// where a pipeline future is abandoned on timeout.
pub struct CleanupGuard {
    cleanup: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CleanupGuard {
    /// Creates a new cleanup guard.
    pub fn new<F>(cleanup: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for CleanupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupGuard")
            .field("armed", &self.cleanup.is_some())
            .finish()
    }
}

/// Counts handles that are currently open for a run.
#[derive(Debug, Clone, Default)]
pub struct HandleTracker {
    open: Arc<AtomicUsize>,
}

impl HandleTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an opened handle; the returned guard records its release.
    #[must_use]
    pub fn track(&self, label: impl Into<String>) -> CleanupGuard {
        let label = label.into();
        self.open.fetch_add(1, Ordering::SeqCst);
        debug!(handle = %label, "Opened");

        let open = self.open.clone();
        CleanupGuard::new(move || {
            open.fetch_sub(1, Ordering::SeqCst);
            debug!(handle = %label, "Released");
        })
    }

    /// Returns the number of handles not yet released.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}
