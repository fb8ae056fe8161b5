//! Pipeline endpoints.
//!
//! Sources and sinks wrap tokio readers and writers. Each one registers a
//! handle on the run context when opened and releases it when dropped.

mod sink;
mod source;

pub use sink::Sink;
pub use source::Source;
