//! The per-language lexing seam.

use crate::base::Token;

/// A language-specific chunk tokenizer.
///
/// Adapters are stateless per call: each chunk is tokenized with no
/// memory of previous chunks, which keeps chunk boundaries independently
/// re-tokenizable after an edit. The price is that a lexeme split across
/// a chunk boundary (see `source::chunk`) surfaces as two tokens, the
/// first usually `ERROR`-flagged; the chunker works to make that rare,
/// not impossible.
///
/// Dynamic dispatch happens only here, at the per-language boundary;
/// the layers consuming the resulting tokens stay monomorphic.
pub trait LexerAdapter: Send + Sync {
    /// Tokenize `chunk`, reporting spans as absolute offsets by adding
    /// `start_offset`. Token text must borrow from `chunk` — never
    /// allocate copies.
    fn tokenize_chunk<'src>(&self, chunk: &'src str, start_offset: usize) -> Vec<Token<'src>>;
}
