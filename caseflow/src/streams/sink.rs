//! Byte sinks.

use crate::cancellation::CleanupGuard;
use crate::config::OutputTarget;
use crate::context::RunContext;
use crate::errors::{CaseflowError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// The writable end of a pipeline.
///
/// A sink detaches itself when the run is cancelled: after that every
/// write fails without touching the underlying writer.
pub struct Sink {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    label: String,
    bytes_written: u64,
    detached: Arc<AtomicBool>,
    _handle: CleanupGuard,
}

impl Sink {
    /// Opens the configured output, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the output file cannot be created.
    pub fn open(output: &OutputTarget, ctx: &RunContext) -> Result<Self> {
        match output {
            OutputTarget::Stdout => Ok(Self::from_writer(tokio::io::stdout(), "stdout", ctx)),
            OutputTarget::File(path) => {
                let file = std::fs::File::create(path).map_err(|e| {
                    CaseflowError::io(format!("cannot create output {}", path.display()), e)
                })?;
                Ok(Self::from_writer(
                    tokio::fs::File::from_std(file),
                    path.display().to_string(),
                    ctx,
                ))
            }
        }
    }

    /// Wraps an arbitrary writer.
    pub fn from_writer<W>(writer: W, label: impl Into<String>, ctx: &RunContext) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let label = label.into();
        let detached = Arc::new(AtomicBool::new(false));
        {
            let detached = detached.clone();
            let label = label.clone();
            ctx.timeout().token().on_cancel(move || {
                detached.store(true, Ordering::SeqCst);
                debug!(sink = %label, "Sink detached");
            });
        }

        Self {
            writer: Box::new(writer),
            _handle: ctx.track_handle(format!("sink:{label}")),
            label,
            bytes_written: 0,
            detached,
        }
    }

    /// Returns a description of the sink.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns true once the sink has been cut off from the pipeline.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Writes one chunk.
    ///
    /// # Errors
    ///
    /// Fails with the run's cancellation error once the sink is detached.
    pub async fn write_chunk(&mut self, data: &[u8], ctx: &RunContext) -> Result<()> {
        if self.is_detached() {
            return Err(ctx.cancellation_error());
        }
        self.writer
            .write_all(data)
            .await
            .map_err(|e| CaseflowError::io(format!("cannot write {}", self.label), e))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flushes buffered bytes to the destination.
    pub async fn finish(&mut self, ctx: &RunContext) -> Result<()> {
        if self.is_detached() {
            return Err(ctx.cancellation_error());
        }
        self.writer
            .flush()
            .await
            .map_err(|e| CaseflowError::io(format!("cannot flush {}", self.label), e))
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("label", &self.label)
            .field("bytes_written", &self.bytes_written)
            .field("detached", &self.is_detached())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_file_sink_writes_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let ctx = RunContext::new(Duration::from_secs(5));

        let mut sink = Sink::open(&OutputTarget::File(path.clone()), &ctx).unwrap();
        sink.write_chunk(b"HEL", &ctx).await.unwrap();
        sink.write_chunk(b"LO", &ctx).await.unwrap();
        sink.finish(&ctx).await.unwrap();
        assert_eq!(sink.bytes_written(), 5);
        drop(sink);

        assert_eq!(std::fs::read(&path).unwrap(), b"HELLO");
        assert_eq!(ctx.open_handles(), 0);
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.txt");
        let ctx = RunContext::new(Duration::from_secs(5));

        let err = Sink::open(&OutputTarget::File(path), &ctx).unwrap_err();
        assert!(matches!(err, CaseflowError::Io { .. }));
    }

    #[tokio::test]
    async fn test_cancel_detaches_sink() {
        let ctx = RunContext::new(Duration::from_secs(5));
        let writer = tokio_test::io::Builder::new().write(b"before").build();
        let mut sink = Sink::from_writer(writer, "mock", &ctx);

        sink.write_chunk(b"before", &ctx).await.unwrap();
        ctx.cancel("stop");
        assert!(sink.is_detached());

        let err = sink.write_chunk(b"after", &ctx).await.unwrap_err();
        assert!(matches!(err, CaseflowError::Cancelled(_)));
        assert_eq!(sink.bytes_written(), 6);
    }
}
