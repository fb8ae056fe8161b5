//! Stage trait and implementations.
//!
//! A stage is a streaming chunk transformer: it receives chunks in order,
//! appends whatever output is ready, and flushes buffered state in
//! [`Stage::finish`]. No stage holds more than a bounded amount of input.

mod chain;
mod gzip;
mod uppercase;

pub use chain::StageChain;
pub use gzip::{GzipDecodeStage, GzipEncodeStage, MAX_INFLATE_RATIO};
pub use uppercase::UppercaseStage;

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for pipeline stages.
pub trait Stage: Send + Debug {
    /// Returns the kind of the stage.
    fn kind(&self) -> StageKind;

    /// Returns the name of the stage.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Transforms one chunk, appending ready output to `out`.
    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()>;

    /// Flushes any buffered state once the input is exhausted.
    ///
    /// Called exactly once, after the last [`Stage::process`].
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()>;
}

/// The kinds of stage a pipeline can contain.
///
/// The derived ordering is the only legal execution order: a pipeline's
/// stages must be strictly increasing by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Gzip decompression.
    Decompress,
    /// Uppercase text mapping.
    Uppercase,
    /// Gzip compression.
    Compress,
}

impl StageKind {
    /// Returns the stage name used in logs and events.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Decompress => "decompress",
            Self::Uppercase => "uppercase",
            Self::Compress => "compress",
        }
    }

    /// Constructs a fresh stage of this kind.
    #[must_use]
    pub fn build(self) -> Box<dyn Stage> {
        match self {
            Self::Decompress => Box::new(GzipDecodeStage::new()),
            Self::Uppercase => Box::new(UppercaseStage::new()),
            Self::Compress => Box::new(GzipEncodeStage::new()),
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order_matches_execution_order() {
        assert!(StageKind::Decompress < StageKind::Uppercase);
        assert!(StageKind::Uppercase < StageKind::Compress);
    }

    #[test]
    fn test_build_produces_matching_kind() {
        for kind in [StageKind::Decompress, StageKind::Uppercase, StageKind::Compress] {
            let stage = kind.build();
            assert_eq!(stage.kind(), kind);
            assert_eq!(stage.name(), kind.name());
        }
    }
}
