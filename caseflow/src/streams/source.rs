//! Byte sources.

use crate::cancellation::CleanupGuard;
use crate::config::InputSource;
use crate::context::RunContext;
use crate::errors::{CaseflowError, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

/// The readable end of a pipeline.
///
/// Owns its reader and a handle guard; dropping the source closes the
/// reader and marks the handle released on the run context.
pub struct Source {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    label: String,
    bytes_read: u64,
    _handle: CleanupGuard,
}

impl Source {
    /// Opens the configured input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the input file cannot be opened.
    pub fn open(input: &InputSource, ctx: &RunContext) -> Result<Self> {
        match input {
            InputSource::Stdin => Ok(Self::from_reader(tokio::io::stdin(), "stdin", ctx)),
            InputSource::File(path) => {
                let file = std::fs::File::open(path).map_err(|e| {
                    CaseflowError::io(format!("cannot open input {}", path.display()), e)
                })?;
                Ok(Self::from_reader(
                    tokio::fs::File::from_std(file),
                    path.display().to_string(),
                    ctx,
                ))
            }
        }
    }

    /// Wraps an arbitrary reader.
    pub fn from_reader<R>(reader: R, label: impl Into<String>, ctx: &RunContext) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let label = label.into();
        Self {
            reader: Box::new(reader),
            _handle: ctx.track_handle(format!("source:{label}")),
            label,
            bytes_read: 0,
        }
    }

    /// Returns a description of the source.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of bytes read so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Reads the next chunk into `buf`. Returns 0 at end of stream.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .reader
            .read(buf)
            .await
            .map_err(|e| CaseflowError::io(format!("cannot read {}", self.label), e))?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("label", &self.label)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}
