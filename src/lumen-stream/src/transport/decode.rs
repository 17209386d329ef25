//! Incremental UTF-8 decoding of response chunks.

use encoding_rs::{CoderResult, Decoder, UTF_8};

/// Streaming UTF-8 decoder.
///
/// A multi-byte character split across two network chunks is held back until
/// the rest arrives. Invalid sequences decode to U+FFFD.
pub struct Utf8Decoder {
    inner: Decoder,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self {
            inner: UTF_8.new_decoder_without_bom_handling(),
        }
    }

    /// Decodes as much of `chunk` (plus any held-back bytes) as possible.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.decode_inner(chunk, false)
    }

    /// Flushes held-back bytes at end of stream.
    ///
    /// An incomplete trailing sequence becomes U+FFFD. The decoder is reset
    /// afterwards and can be reused.
    pub fn finish(&mut self) -> String {
        let tail = self.decode_inner(&[], true);
        self.inner = UTF_8.new_decoder_without_bom_handling();
        tail
    }

    fn decode_inner(&mut self, mut src: &[u8], last: bool) -> String {
        let mut out = String::new();
        loop {
            let needed = self
                .inner
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len().saturating_add(16));
            out.reserve(needed);

            let (result, read, _replaced) = self.inner.decode_to_string(src, &mut out, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Utf8Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utf8Decoder").finish_non_exhaustive()
    }
}
