//! Pipeline builder with validation.

use super::Pipeline;
use crate::config::{Config, DEFAULT_CHUNK_SIZE};
use crate::context::RunContext;
use crate::errors::{CaseflowError, Result};
use crate::stages::{StageChain, StageKind};
use crate::streams::{Sink, Source};
use tracing::debug;

/// Builder for creating validated pipelines.
///
/// Stages are recorded as kinds and only constructed in [`PipelineBuilder::build`],
/// so a builder can be inspected and reused.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    kinds: Vec<StageKind>,
    chunk_size: usize,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Creates a builder with the stages a configuration selects.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            kinds: config.stage_kinds(),
            chunk_size: config.chunk_size(),
        }
    }

    /// Appends a stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage would run before or alongside one
    /// already added: decompress, uppercase and compress must appear in that
    /// order, each at most once.
    pub fn stage(mut self, kind: StageKind) -> Result<Self> {
        if let Some(last) = self.kinds.last() {
            if *last >= kind {
                return Err(CaseflowError::InvalidPipeline(format!(
                    "stage '{kind}' cannot follow '{last}'"
                )));
            }
        }
        self.kinds.push(kind);
        Ok(self)
    }

    /// Sets the source read size.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Returns the stage kinds in execution order.
    #[must_use]
    pub fn kinds(&self) -> &[StageKind] {
        &self.kinds
    }

    /// Connects the stages between a source and a sink.
    ///
    /// No data flows until the pipeline is run.
    #[must_use]
    pub fn build(&self, source: Source, sink: Sink) -> Pipeline {
        debug!(
            stages = ?self.kinds,
            source = source.label(),
            sink = sink.label(),
            "Pipeline wired"
        );
        Pipeline::new(
            StageChain::from_kinds(&self.kinds),
            source,
            sink,
            self.chunk_size,
        )
    }
}

/// Builds the pipeline for a configuration around an opened source.
///
/// The stages are `[decompress?] → uppercase → [compress?]`, and the sink is
/// stdout or a freshly created file at the configured (already suffixed)
/// path.
///
/// # Errors
///
/// Returns an I/O error if the sink cannot be created.
pub fn build_pipeline(config: &Config, source: Source, ctx: &RunContext) -> Result<Pipeline> {
    let sink = Sink::open(config.output(), ctx)?;
    Ok(PipelineBuilder::from_config(config).build(source, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_accepts_ordered_stages() {
        let builder = PipelineBuilder::new()
            .stage(StageKind::Decompress)
            .unwrap()
            .stage(StageKind::Uppercase)
            .unwrap()
            .stage(StageKind::Compress)
            .unwrap();

        assert_eq!(
            builder.kinds(),
            &[StageKind::Decompress, StageKind::Uppercase, StageKind::Compress]
        );
    }

    #[test]
    fn test_builder_rejects_reordering() {
        let result = PipelineBuilder::new()
            .stage(StageKind::Compress)
            .unwrap()
            .stage(StageKind::Uppercase);

        let err = result.unwrap_err();
        assert!(matches!(err, CaseflowError::InvalidPipeline(_)));
        assert!(err.to_string().contains("'uppercase' cannot follow 'compress'"));
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = PipelineBuilder::new()
            .stage(StageKind::Uppercase)
            .unwrap()
            .stage(StageKind::Uppercase);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config() {
        let config = Config::builder("/data")
            .stdin()
            .uncompress(true)
            .chunk_size(512)
            .build()
            .unwrap();
        let builder = PipelineBuilder::from_config(&config);
        assert_eq!(builder.kinds(), &[StageKind::Decompress, StageKind::Uppercase]);
    }

    #[tokio::test]
    async fn test_build_pipeline_creates_sink_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::builder(dir.path())
            .stdin()
            .compress(true)
            .build()
            .unwrap();
        let ctx = RunContext::new(Duration::from_secs(5));
        let source = Source::from_reader(tokio::io::empty(), "empty", &ctx);

        let pipeline = build_pipeline(&config, source, &ctx).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["uppercase", "compress"]);
        assert!(dir.path().join("out.txt.gz").exists());
        assert_eq!(ctx.open_handles(), 2);

        drop(pipeline);
        assert_eq!(ctx.open_handles(), 0);
    }

    #[test]
    fn test_build_pipeline_sink_failure_releases_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::builder(dir.path())
            .stdin()
            .outfile("missing/out.txt")
            .build()
            .unwrap();
        let ctx = RunContext::new(Duration::from_secs(5));
        let source = Source::from_reader(tokio::io::empty(), "empty", &ctx);

        let err = build_pipeline(&config, source, &ctx).unwrap_err();
        assert!(matches!(err, CaseflowError::Io { .. }));
        assert_eq!(ctx.open_handles(), 0);
    }
}
