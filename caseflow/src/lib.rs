//! # Caseflow
//!
//! Streams bytes from a file or stdin through an optional gzip decoder, an
//! uppercase mapping and an optional gzip encoder into a file or stdout,
//! under a single deadline for the whole run.
//!
//! - **Stages**: streaming chunk transformers in a fixed order
//! - **Pipeline**: one source, one stage chain, one sink per run
//! - **Cancellation**: a timeout token raced against the run; on expiry the
//!   pipeline is dropped and every handle released
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use caseflow::prelude::*;
//!
//! let config = Config::builder("/data")
//!     .file("in.txt")
//!     .compress(true)
//!     .build()?;
//!
//! let report = execute(&config, Arc::new(NoOpEventSink)).await?;
//! println!("wrote {} bytes to {}", report.bytes_written, report.sink);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss
)]

pub mod cancellation;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod streams;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, TimeoutToken, TIMEOUT_REASON};
    pub use crate::cli::{Cli, Invocation};
    pub use crate::config::{Config, ConfigBuilder, InputSource, OutputTarget};
    pub use crate::context::RunContext;
    pub use crate::errors::{CaseflowError, Result};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent,
    };
    pub use crate::pipeline::{
        build_pipeline, execute, run_guarded, Pipeline, PipelineBuilder, PipelineReport,
    };
    pub use crate::stages::{Stage, StageChain, StageKind};
    pub use crate::streams::{Sink, Source};
}
