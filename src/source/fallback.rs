//! Whitespace-delimited fallback tokenization.
//!
//! Used when no language adapter is registered, and as the baseline for
//! exercising the streaming machinery itself. Every maximal run of
//! non-whitespace bytes becomes one `Ident` token; whitespace is not
//! emitted at all.

use tracing::warn;

use crate::base::{Span, Token, TokenKind};

use super::adapter::LexerAdapter;

/// Hard cap on tokens produced from a single chunk.
///
/// A runaway input (say, one byte per token for megabytes) would
/// otherwise grow the buffered window without bound. Hitting the cap
/// truncates the chunk's token list and logs; it never fails the call.
pub const MAX_TOKENS_PER_CHUNK: usize = 10_000;

/// Rough tokens-per-byte guess used to pre-size the output buffer.
const EXPECTED_BYTES_PER_TOKEN: usize = 6;

/// Tokenize one chunk by whitespace runs. Offsets are absolute.
pub fn tokenize_whitespace<'src>(chunk: &'src str, start_offset: usize) -> Vec<Token<'src>> {
    let mut tokens =
        Vec::with_capacity((chunk.len() / EXPECTED_BYTES_PER_TOKEN + 1).min(MAX_TOKENS_PER_CHUNK));

    let mut word_start: Option<usize> = None;
    for (i, ch) in chunk.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                if !push_word(&mut tokens, chunk, start, i, start_offset) {
                    return tokens;
                }
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        push_word(&mut tokens, chunk, start, chunk.len(), start_offset);
    }

    tokens
}

fn push_word<'src>(
    tokens: &mut Vec<Token<'src>>,
    chunk: &'src str,
    start: usize,
    end: usize,
    start_offset: usize,
) -> bool {
    if tokens.len() >= MAX_TOKENS_PER_CHUNK {
        warn!(
            limit = MAX_TOKENS_PER_CHUNK,
            chunk_len = chunk.len(),
            "per-chunk token cap hit; truncating chunk token list"
        );
        return false;
    }
    let span = Span::new(start_offset + start, start_offset + end);
    tokens.push(Token::new(TokenKind::Ident, span, &chunk[start..end]));
    true
}

/// The fallback tokenizer as a plug-compatible adapter.
///
/// Lets tests and degenerate configurations route through the same
/// adapter seam as real languages.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceLexer;

impl LexerAdapter for WhitespaceLexer {
    fn tokenize_chunk<'src>(&self, chunk: &'src str, start_offset: usize) -> Vec<Token<'src>> {
        tokenize_whitespace(chunk, start_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_become_tokens() {
        let tokens = tokenize_whitespace("a bb  ccc", 0);

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].text, "bb");
        assert_eq!(tokens[2].text, "ccc");
        assert_eq!(tokens[2].span, Span::new(6, 9));
    }

    #[test]
    fn test_offsets_are_absolute() {
        let tokens = tokenize_whitespace("x y", 100);

        assert_eq!(tokens[0].span, Span::new(100, 101));
        assert_eq!(tokens[1].span, Span::new(102, 103));
    }

    #[test]
    fn test_whitespace_only_chunk() {
        assert!(tokenize_whitespace("   \n\t  ", 0).is_empty());
    }

    #[test]
    fn test_token_cap_truncates() {
        let input = "x ".repeat(MAX_TOKENS_PER_CHUNK + 50);
        let tokens = tokenize_whitespace(&input, 0);
        assert_eq!(tokens.len(), MAX_TOKENS_PER_CHUNK);
    }
}
