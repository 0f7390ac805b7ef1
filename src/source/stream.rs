//! The pull-based streaming token source.
//!
//! `TokenSource` delivers tokens for an arbitrarily large input without
//! ever materializing the full token sequence: it buffers one chunk's
//! tokens at a time and reloads on demand. All work happens inline in
//! `next()`/`peek()` — single-threaded, synchronous, no I/O.

use std::mem;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::base::{Span, Token};
use crate::config::EngineConfig;

use super::adapter::LexerAdapter;
use super::chunk::{self, ChunkCut};
use super::fallback;

/// Instrumentation snapshot of the source's buffer state.
///
/// Queryable at any time. Byte costs are estimates: tokens are zero-copy
/// views, so the dominant cost is the token structs themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryStats {
    /// Tokens currently buffered and not yet consumed.
    pub buffered_tokens: usize,
    /// Estimated bytes held by the buffered window.
    pub buffered_bytes: usize,
    /// Percent of the streamed region already chunked, 0.0–100.0.
    pub progress_percent: f32,
}

/// A chunked, pull-based token iterator over a source region.
///
/// The region defaults to the whole buffer; `for_range` restricts it to
/// a sub-range for viewport-driven re-analysis. Token spans are always
/// absolute offsets into the full buffer either way.
pub struct TokenSource<'src> {
    source: &'src str,
    adapter: Option<Arc<dyn LexerAdapter>>,
    chunk_size: usize,
    search_window: usize,
    /// Streamed region, `range.start <= offset <= range.end`.
    range: Span,
    /// Next byte to chunk.
    offset: usize,
    /// Buffered tokens of the current chunk.
    window: Vec<Token<'src>>,
    /// Read cursor into `window`.
    cursor: usize,
    /// Chunk cuts taken without a safe split point this pass.
    unsafe_cuts: u32,
}

impl<'src> TokenSource<'src> {
    /// Stream the whole buffer.
    pub fn new(source: &'src str, adapter: Option<Arc<dyn LexerAdapter>>, config: &EngineConfig) -> Self {
        Self::for_range(source, Span::new(0, source.len()), adapter, config)
    }

    /// Stream a sub-range of the buffer. The range is clamped to the
    /// buffer and to char boundaries.
    pub fn for_range(
        source: &'src str,
        range: Span,
        adapter: Option<Arc<dyn LexerAdapter>>,
        config: &EngineConfig,
    ) -> Self {
        debug_assert!(config.chunk_size > 0, "zero chunk size; validate the config");
        let start = chunk::floor_char_boundary(source, range.start.min(source.len()));
        let end = chunk::floor_char_boundary(source, range.end.min(source.len()));
        let range = Span::new(start, end.max(start));
        Self {
            source,
            adapter,
            chunk_size: config.chunk_size,
            search_window: config.search_window,
            range,
            offset: range.start,
            window: Vec::new(),
            cursor: 0,
            unsafe_cuts: 0,
        }
    }

    /// Consume and return the next token, loading chunks as needed.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Token<'src>> {
        self.fill_window();
        let token = self.window.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(token)
    }

    /// Return the next token without advancing.
    ///
    /// May load a chunk; the read cursor over the buffered window is
    /// left where it was.
    pub fn peek(&mut self) -> Option<Token<'src>> {
        self.fill_window();
        self.window.get(self.cursor).copied()
    }

    /// Rewind to the start of the streamed region and clear the
    /// buffered window. Per-pass counters restart.
    pub fn reset(&mut self) {
        self.offset = self.range.start;
        self.window.clear();
        self.cursor = 0;
        self.unsafe_cuts = 0;
    }

    /// True once every token of the region has been consumed.
    pub fn is_eof(&self) -> bool {
        self.cursor >= self.window.len() && self.offset >= self.range.end
    }

    /// The underlying source buffer.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// The streamed region, in absolute offsets.
    pub fn range(&self) -> Span {
        self.range
    }

    /// Bytes of the region already chunked.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Chunk cuts this pass that landed mid-lexeme.
    pub fn unsafe_cuts(&self) -> u32 {
        self.unsafe_cuts
    }

    /// Current buffer statistics; cheap, callable at any time.
    pub fn memory_stats(&self) -> MemoryStats {
        let buffered = self.window.len().saturating_sub(self.cursor);
        let region = self.range.len();
        let progress = if region == 0 {
            100.0
        } else {
            (self.offset - self.range.start) as f32 / region as f32 * 100.0
        };
        MemoryStats {
            buffered_tokens: buffered,
            buffered_bytes: self.window.capacity() * mem::size_of::<Token<'src>>(),
            progress_percent: progress,
        }
    }

    /// Load chunks until the window has an unread token or the region
    /// is exhausted. A chunk can legitimately produce zero tokens
    /// (all-whitespace input under the fallback tokenizer), hence the
    /// loop.
    fn fill_window(&mut self) {
        while self.cursor >= self.window.len() && self.offset < self.range.end {
            self.load_chunk();
        }
    }

    fn load_chunk(&mut self) {
        let ChunkCut { end, safe } = chunk::chunk_end(
            self.source,
            self.offset,
            self.range.end,
            self.chunk_size,
            self.search_window,
        );
        if !safe {
            self.unsafe_cuts += 1;
            warn!(
                offset = self.offset,
                end,
                window = self.search_window,
                "no safe split point in window; cutting chunk mid-lexeme"
            );
        }

        let chunk_text = &self.source[self.offset..end];
        self.window = match &self.adapter {
            Some(adapter) => adapter.tokenize_chunk(chunk_text, self.offset),
            None => fallback::tokenize_whitespace(chunk_text, self.offset),
        };
        self.cursor = 0;
        trace!(
            offset = self.offset,
            end,
            tokens = self.window.len(),
            "loaded chunk"
        );
        self.offset = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(chunk_size: usize) -> EngineConfig {
        EngineConfig::default().with_chunk_size(chunk_size)
    }

    fn drain(source: &mut TokenSource<'_>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(token) = source.next() {
            out.push(token.text.to_string());
        }
        out
    }

    #[test]
    fn test_streams_across_chunks() {
        let input = "alpha beta gamma delta epsilon";
        let mut source = TokenSource::new(input, None, &small_config(8));

        let words = drain(&mut source);
        assert_eq!(words, vec!["alpha", "beta", "gamma", "delta", "epsilon"]);
        assert!(source.is_eof());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut source = TokenSource::new("one two", None, &small_config(64));

        assert_eq!(source.peek().unwrap().text, "one");
        assert_eq!(source.peek().unwrap().text, "one");
        assert_eq!(source.next().unwrap().text, "one");
        assert_eq!(source.peek().unwrap().text, "two");
    }

    #[test]
    fn test_reset_rewinds() {
        let mut source = TokenSource::new("a b c", None, &small_config(64));

        assert_eq!(drain(&mut source).len(), 3);
        assert!(source.is_eof());

        source.reset();
        assert!(!source.is_eof());
        assert_eq!(drain(&mut source).len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let mut source = TokenSource::new("", None, &small_config(64));
        assert!(source.next().is_none());
        assert!(source.is_eof());
        assert_eq!(source.memory_stats().progress_percent, 100.0);
    }

    #[test]
    fn test_range_restricts_streaming() {
        let input = "aa bb cc dd";
        let mut source = TokenSource::for_range(input, Span::new(3, 8), None, &small_config(64));

        let words = drain(&mut source);
        assert_eq!(words, vec!["bb", "cc"]);
    }

    #[test]
    fn test_spans_stay_absolute_in_range_mode() {
        let input = "aa bb cc";
        let mut source = TokenSource::for_range(input, Span::new(3, 8), None, &small_config(64));

        let token = source.next().unwrap();
        assert_eq!(token.span, Span::new(3, 5));
        assert_eq!(token.text, "bb");
    }

    #[test]
    fn test_memory_stats_progress() {
        let input = "a ".repeat(100);
        let mut source = TokenSource::new(&input, None, &small_config(16));

        assert_eq!(source.memory_stats().progress_percent, 0.0);
        source.next();
        let mid = source.memory_stats();
        assert!(mid.progress_percent > 0.0 && mid.progress_percent < 100.0);

        while source.next().is_some() {}
        assert_eq!(source.memory_stats().progress_percent, 100.0);
        assert_eq!(source.memory_stats().buffered_tokens, 0);
    }

    #[test]
    fn test_unsafe_cut_is_counted_not_fatal() {
        // A single 40-byte lexeme with chunk size 8: every interior cut
        // is unsafe, but streaming still completes.
        let input = "x".repeat(40);
        let mut source = TokenSource::new(&input, None, &small_config(8));

        let words = drain(&mut source);
        assert_eq!(words.len(), 5); // One fragment per chunk.
        assert!(source.unsafe_cuts() > 0);
    }
}
