//! Pipeline building and execution.
//!
//! This module provides:
//! - The pipeline builder, which fixes stage order
//! - The chunk pump that moves bytes from source through stages to sink
//! - The cancellation guard racing a run against its deadline

mod builder;
mod guard;

pub use builder::{build_pipeline, PipelineBuilder};
pub use guard::run_guarded;

use crate::config::Config;
use crate::context::RunContext;
use crate::errors::Result;
use crate::events::EventSink;
use crate::stages::StageChain;
use crate::streams::{Sink, Source};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Stage names in execution order.
    pub stages: Vec<String>,
    /// Source description.
    pub source: String,
    /// Sink description.
    pub sink: String,
    /// Bytes read from the source.
    pub bytes_read: u64,
    /// Bytes written to the sink.
    pub bytes_written: u64,
    /// Run duration.
    pub duration_ms: f64,
}

/// A source, a stage chain and a sink, wired for one run.
#[derive(Debug)]
pub struct Pipeline {
    chain: StageChain,
    source: Source,
    sink: Sink,
    chunk_size: usize,
}

impl Pipeline {
    pub(crate) fn new(chain: StageChain, source: Source, sink: Sink, chunk_size: usize) -> Self {
        Self {
            chain,
            source,
            sink,
            chunk_size,
        }
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Returns the source description.
    #[must_use]
    pub fn source_label(&self) -> &str {
        self.source.label()
    }

    /// Returns the sink description.
    #[must_use]
    pub fn sink_label(&self) -> &str {
        self.sink.label()
    }

    /// Pumps the source through the stages into the sink until the source
    /// is exhausted and the sink is flushed.
    ///
    /// The context is checked before every read and write. Consuming `self`
    /// means all handles are released when this future completes or is
    /// dropped.
    pub async fn run(mut self, ctx: &RunContext) -> Result<(u64, u64)> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            ctx.check()?;
            let n = self.source.read_chunk(&mut buf).await?;
            if n == 0 {
                break;
            }
            let out = self.chain.process(&buf[..n])?;
            trace!(read = n, emitted = out.len(), "Chunk processed");
            if !out.is_empty() {
                ctx.check()?;
                self.sink.write_chunk(&out, ctx).await?;
            }
        }

        let tail = self.chain.finish()?;
        ctx.check()?;
        if !tail.is_empty() {
            self.sink.write_chunk(&tail, ctx).await?;
        }
        self.sink.finish(ctx).await?;
        Ok((self.source.bytes_read(), self.sink.bytes_written()))
    }
}

/// Runs one configured invocation end to end.
///
/// The deadline starts before the source is opened, so it covers the whole
/// run.
///
/// # Errors
///
/// Returns the first error from opening, processing or the deadline.
pub async fn execute(config: &Config, event_sink: Arc<dyn EventSink>) -> Result<PipelineReport> {
    let ctx = RunContext::new(config.timeout()).with_event_sink(event_sink);
    let source = Source::open(config.input(), &ctx)?;
    let pipeline = build_pipeline(config, source, &ctx)?;
    run_guarded(pipeline, &ctx).await
}
