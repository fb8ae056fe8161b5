//! Uppercase text mapping.

use super::{Stage, StageKind};
use crate::errors::Result;

/// Maps UTF-8 text to its Unicode uppercase form.
///
/// Chunk boundaries may split a multi-byte character; the incomplete tail
/// (at most three bytes) is held back and joined to the next chunk, so the
/// output does not depend on how the input was chunked. Byte sequences that
/// are not valid UTF-8 are copied through unchanged.
#[derive(Debug, Default)]
pub struct UppercaseStage {
    pending: Vec<u8>,
}

impl UppercaseStage {
    /// Creates a new uppercase stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `data` into `out` and returns the incomplete trailing sequence,
    /// if any.
    fn map_utf8<'a>(mut data: &'a [u8], out: &mut Vec<u8>) -> &'a [u8] {
        loop {
            match std::str::from_utf8(data) {
                Ok(text) => {
                    push_upper(text, out);
                    return &[];
                }
                Err(err) => {
                    let (valid, rest) = data.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        push_upper(text, out);
                    }
                    match err.error_len() {
                        Some(len) => {
                            out.extend_from_slice(&rest[..len]);
                            data = &rest[len..];
                        }
                        None => return rest,
                    }
                }
            }
        }
    }
}

fn push_upper(text: &str, out: &mut Vec<u8>) {
    if text.is_ascii() {
        out.extend(text.bytes().map(|b| b.to_ascii_uppercase()));
    } else {
        out.extend_from_slice(text.to_uppercase().as_bytes());
    }
}

impl Stage for UppercaseStage {
    fn kind(&self) -> StageKind {
        StageKind::Uppercase
    }

    fn process(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if self.pending.is_empty() {
            let tail = Self::map_utf8(input, out);
            self.pending.extend_from_slice(tail);
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(input);
            let tail = Self::map_utf8(&joined, out);
            self.pending = tail.to_vec();
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        // A truncated final character is not text; pass it through as-is.
        out.append(&mut self.pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(chunks: &[&[u8]]) -> Vec<u8> {
        let mut stage = UppercaseStage::new();
        let mut out = Vec::new();
        for chunk in chunks {
            stage.process(chunk, &mut out).unwrap();
        }
        stage.finish(&mut out).unwrap();
        out
    }

    #[test]
    fn test_ascii() {
        assert_eq!(run(&[b"hello\n"]), b"HELLO\n".to_vec());
    }

    #[test]
    fn test_ascii_is_chunk_independent() {
        let input = b"the quick brown fox jumps over the lazy dog 0123456789";
        let whole = run(&[input]);
        for split in 0..input.len() {
            let (a, b) = input.split_at(split);
            assert_eq!(run(&[a, b]), whole, "split at {split}");
        }
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let input = "héllo wörld ß 日本".as_bytes();
        let expected = "HÉLLO WÖRLD SS 日本".as_bytes().to_vec();
        assert_eq!(run(&[input]), expected);

        for split in 0..input.len() {
            let (a, b) = input.split_at(split);
            assert_eq!(run(&[a, b]), expected, "split at {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let input = "ça va? ünïcödé".as_bytes();
        let chunks: Vec<&[u8]> = input.chunks(1).collect();
        assert_eq!(run(&chunks), "ÇA VA? ÜNÏCÖDÉ".as_bytes().to_vec());
    }

    #[test]
    fn test_invalid_bytes_pass_through() {
        let input: &[u8] = &[b'a', 0xff, b'b', 0xc3, 0x28, b'c'];
        assert_eq!(run(&[input]), vec![b'A', 0xff, b'B', 0xc3, b'(', b'C']);
    }

    #[test]
    fn test_truncated_trailing_sequence_is_flushed() {
        // First two bytes of a three-byte character.
        let input: &[u8] = &[b'x', 0xe6, 0x97];
        assert_eq!(run(&[input]), vec![b'X', 0xe6, 0x97]);
    }

    #[test]
    fn test_idempotent() {
        let input = "Mixed Case ǅ straße ﬁ text".as_bytes();
        let once = run(&[input]);
        let twice = run(&[&once]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[]).is_empty());
        assert!(run(&[b""]).is_empty());
    }
}
