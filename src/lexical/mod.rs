//! Layer 0 — viewport lexing.
//!
//! Given a byte-range viewport into a large buffer, return the tokens
//! covering it without tokenizing the whole file. The viewport is
//! widened (within a bounded window) to a position where lexing can
//! start cleanly, the widened window is streamed through the usual
//! chunked source, and only tokens intersecting the viewport are kept.
//!
//! Budget: sub-0.1 ms for typical editor viewports. That is a target
//! for implementors and benchmark suites, not an enforced abort.

use std::sync::Arc;

use crate::base::{Span, Token};
use crate::config::EngineConfig;
use crate::source::{LexerAdapter, TokenSource, floor_char_boundary};

/// Widen `viewport` to a range that starts and ends at plausible lexeme
/// boundaries, searching at most `window` bytes in each direction.
///
/// When no whitespace exists inside the window the original edge is
/// kept (clamped to a char boundary) and lexing may start mid-lexeme;
/// the resulting error token is confined to the viewport edge.
pub fn widen_to_safe_bounds(source: &str, viewport: Span, window: usize) -> Span {
    let len = source.len();
    let bytes = source.as_bytes();

    let clamped_start = floor_char_boundary(source, viewport.start.min(len));
    let clamped_end = floor_char_boundary(source, viewport.end.min(len));

    let floor = clamped_start.saturating_sub(window);
    let mut start = clamped_start;
    loop {
        if start == 0 || bytes[start - 1].is_ascii_whitespace() {
            break; // Clean lexing start.
        }
        if start <= floor {
            // No safe point in the window; keep the original edge.
            start = clamped_start;
            break;
        }
        start -= 1;
        while start > 0 && !source.is_char_boundary(start) {
            start -= 1;
        }
    }

    let ceil = clamped_end.saturating_add(window).min(len);
    let mut end = clamped_end;
    while end < ceil && !bytes[end].is_ascii_whitespace() {
        end += 1;
        while end < len && !source.is_char_boundary(end) {
            end += 1;
        }
    }

    Span::new(start.min(end), end)
}

/// Tokenize the part of `source` covered by `viewport`.
///
/// Tokens come back with absolute spans, in source order, restricted to
/// those intersecting the viewport. Malformed lexemes yield
/// `ERROR`-flagged tokens; the call itself never fails.
pub fn tokenize_range<'src>(
    source: &'src str,
    viewport: Span,
    adapter: Option<Arc<dyn LexerAdapter>>,
    config: &EngineConfig,
) -> Vec<Token<'src>> {
    let widened = widen_to_safe_bounds(source, viewport, config.search_window);
    let mut stream = TokenSource::for_range(source, widened, adapter, config);

    let mut tokens = Vec::new();
    while let Some(token) = stream.next() {
        if token.span.intersects(viewport)
            || (token.span.is_empty() && viewport.contains_offset(token.span.start))
        {
            tokens.push(token);
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_viewport_returns_only_intersecting_tokens() {
        let source = "alpha beta gamma delta";
        // Viewport covers "beta gamma".
        let tokens = tokenize_range(source, Span::new(6, 16), None, &config());

        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["beta", "gamma"]);
    }

    #[test]
    fn test_viewport_mid_token_widens_backward() {
        let source = "alpha beta gamma";
        // Viewport starts inside "beta"; the whole token must come back.
        let tokens = tokenize_range(source, Span::new(8, 16), None, &config());

        assert_eq!(tokens[0].text, "beta");
        assert_eq!(tokens[0].span, Span::new(6, 10));
    }

    #[test]
    fn test_viewport_mid_token_widens_forward() {
        let source = "alpha beta gamma";
        // Viewport ends inside "gamma".
        let tokens = tokenize_range(source, Span::new(6, 13), None, &config());

        let last = tokens.last().unwrap();
        assert_eq!(last.text, "gamma");
    }

    #[test]
    fn test_empty_viewport_yields_containing_token() {
        // A zero-width viewport (a cursor position) returns the token
        // surrounding it.
        let source = "alpha beta";
        let tokens = tokenize_range(source, Span::empty(3), None, &config());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "alpha");
    }

    #[test]
    fn test_viewport_past_end_is_clamped() {
        let source = "alpha";
        let tokens = tokenize_range(source, Span::new(2, 400), None, &config());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "alpha");
    }

    #[test]
    fn test_widen_bounded_by_window() {
        // A 600-byte lexeme: the backward search gives up after the
        // window and starts mid-lexeme rather than scanning to offset 0.
        let long = "y".repeat(600);
        let source = format!("{long} tail");
        let widened = widen_to_safe_bounds(&source, Span::new(500, 604), 64);
        assert!(widened.start >= 500 - 64);
    }
}
