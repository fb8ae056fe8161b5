//! Gzip stages via flate2 with streaming enc/dec.

use super::{Stage, StageKind};
use crate::errors::{CaseflowError, Result};
use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Write;
use tracing::debug;

fn decode_error(err: &std::io::Error) -> CaseflowError {
    CaseflowError::Decode(err.to_string())
}

/// Upper bound on deflate expansion: one input byte never inflates to more
/// than this many output bytes.
pub const MAX_INFLATE_RATIO: usize = 1032;

/// Gzip decompression.
///
/// Concatenated gzip members are decoded back to back, as `gunzip` does.
/// Zero bytes after a member trailer are padding and are skipped; any other
/// byte starts the next member.
///
/// Output for one input chunk is bounded by the chunk length times
/// [`MAX_INFLATE_RATIO`], plus at most one decoder buffer carried over from
/// the previous chunk.
pub struct GzipDecodeStage {
    decoder: GzDecoder<Vec<u8>>,
    member_done: bool,
    members: usize,
}

impl GzipDecodeStage {
    /// Creates a new decompression stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoder: GzDecoder::new(Vec::new()),
            member_done: false,
            members: 0,
        }
    }

    fn end_member(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.decoder.try_finish().map_err(|e| decode_error(&e))?;
        out.append(self.decoder.get_mut());
        self.member_done = true;
        self.members += 1;
        debug!(members = self.members, "Gzip member decoded");
        Ok(())
    }
}

impl std::fmt::Debug for GzipDecodeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipDecodeStage")
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

impl Default for GzipDecodeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for GzipDecodeStage {
    fn kind(&self) -> StageKind {
        StageKind::Decompress
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        let mut rest = input;
        while !rest.is_empty() {
            if self.member_done {
                let padding = rest.iter().take_while(|&&b| b == 0).count();
                rest = &rest[padding..];
                if rest.is_empty() {
                    break;
                }
                self.decoder = GzDecoder::new(Vec::new());
                self.member_done = false;
            }
            // Zero means the current member has ended.
            let n = self.decoder.write(rest).map_err(|e| decode_error(&e))?;
            if n == 0 {
                self.end_member(out)?;
                continue;
            }
            rest = &rest[n..];
        }
        out.append(self.decoder.get_mut());
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if !self.member_done {
            self.end_member(out)?;
        }
        Ok(())
    }
}

/// Gzip compression at the default level.
pub struct GzipEncodeStage {
    encoder: GzEncoder<Vec<u8>>,
}

impl std::fmt::Debug for GzipEncodeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipEncodeStage")
            .field("buffered", &self.encoder.get_ref().len())
            .finish_non_exhaustive()
    }
}

impl GzipEncodeStage {
    /// Creates a new compression stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), Compression::default()),
        }
    }
}

impl Default for GzipEncodeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for GzipEncodeStage {
    fn kind(&self) -> StageKind {
        StageKind::Compress
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.encoder
            .write_all(input)
            .map_err(|e| CaseflowError::io("gzip compression failed", e))?;
        out.append(self.encoder.get_mut());
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.encoder
            .try_finish()
            .map_err(|e| CaseflowError::io("gzip compression failed", e))?;
        out.append(self.encoder.get_mut());
        Ok(())
    }
}
