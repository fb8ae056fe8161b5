//! Ordered composition of stages.

use super::{Stage, StageKind};
use crate::errors::Result;

/// An ordered list of stages applied to each chunk in turn.
#[derive(Debug, Default)]
pub struct StageChain {
    stages: Vec<Box<dyn Stage>>,
}

impl StageChain {
    /// Creates a chain from already ordered stages.
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Creates a chain by constructing each kind in order.
    #[must_use]
    pub fn from_kinds(kinds: &[StageKind]) -> Self {
        Self::new(kinds.iter().map(|kind| kind.build()).collect())
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Pushes one chunk through every stage and returns the final output.
    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut carry = chunk.to_vec();
        for stage in &mut self.stages {
            let mut out = Vec::with_capacity(carry.len());
            stage.process(&carry, &mut out)?;
            carry = out;
            if carry.is_empty() {
                break;
            }
        }
        Ok(carry)
    }

    /// Finishes every stage in order.
    ///
    /// Each stage first receives whatever its upstream flushed, then is
    /// finished itself, so buffered bytes cascade to the end of the chain.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let mut carry = Vec::new();
        for stage in &mut self.stages {
            let mut out = Vec::new();
            if !carry.is_empty() {
                stage.process(&carry, &mut out)?;
            }
            stage.finish(&mut out)?;
            carry = out;
        }
        Ok(carry)
    }
}
