//! Cancellation guard for a running pipeline.

use super::{Pipeline, PipelineReport};
use crate::context::RunContext;
use crate::errors::Result;
use crate::events::PipelineEvent;
use crate::observability::SpanTimer;
use tracing::{info, warn};

/// Runs a pipeline under the context's deadline.
///
/// Exactly one of two outcomes wins the race:
/// - the pipeline drains its source and flushes its sink, giving a report;
/// - the timeout token fires, the pipeline future is dropped (closing the
///   source, every stage and the sink) and the run fails with the token's
///   error.
///
/// Stage and I/O errors end the run as well; nothing is retried.
pub async fn run_guarded(pipeline: Pipeline, ctx: &RunContext) -> Result<PipelineReport> {
    let timer = SpanTimer::start("pipeline");
    let run_id = ctx.run_id();
    let stages: Vec<String> = pipeline
        .stage_names()
        .into_iter()
        .map(String::from)
        .collect();
    let source = pipeline.source_label().to_string();
    let sink = pipeline.sink_label().to_string();

    ctx.event_sink()
        .emit(&PipelineEvent::Started {
            run_id,
            started_at: ctx.started_at(),
            stages: stages.clone(),
            source: source.clone(),
            sink: sink.clone(),
            timeout_ms: u64::try_from(ctx.timeout().timeout().as_millis()).unwrap_or(u64::MAX),
        })
        .await;

    let outcome = tokio::select! {
        biased;
        result = pipeline.run(ctx) => result,
        () = ctx.timeout().expired() => Err(ctx.cancellation_error()),
    };

    let duration_ms = timer.finish();
    match outcome {
        Ok((bytes_read, bytes_written)) => {
            info!(%run_id, bytes_read, bytes_written, duration_ms, "Pipeline completed");
            ctx.event_sink()
                .emit(&PipelineEvent::Completed {
                    run_id,
                    bytes_read,
                    bytes_written,
                    duration_ms,
                })
                .await;
            Ok(PipelineReport {
                run_id,
                stages,
                source,
                sink,
                bytes_read,
                bytes_written,
                duration_ms,
            })
        }
        Err(err) if err.is_timeout() => {
            warn!(%run_id, duration_ms, open_handles = ctx.open_handles(), "Pipeline timed out");
            ctx.event_sink()
                .emit(&PipelineEvent::TimedOut {
                    run_id,
                    reason: err.to_string(),
                    elapsed_ms: duration_ms,
                })
                .await;
            Err(err)
        }
        Err(err) => {
            warn!(%run_id, error = %err, "Pipeline failed");
            ctx.event_sink()
                .emit(&PipelineEvent::Failed {
                    run_id,
                    error: err.to_json(),
                })
                .await;
            Err(err)
        }
    }
}
