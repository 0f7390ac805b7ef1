//! Layer 1 — structural boundary detection.
//!
//! Consumes a token sequence and emits coarse structural extents
//! (blocks, declarations) without building a parse tree. Detection is
//! driven by delimiter-depth tracking on the open/close flags, plus one
//! language-agnostic heuristic: an opener directly preceded by a
//! keyword-like token starts a declaration rather than a bare block.
//!
//! Malformed nesting is not an error here. Unmatched delimiters degrade
//! the affected boundary's confidence and are tallied on the result.
//!
//! Budget: sub-1 ms for a full small/medium file. Pure function of its
//! input slice; no side effects.

use crate::base::{Span, Token, TokenKind};

/// What kind of structural unit a boundary delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// A bare delimited extent (`{...}`, `[...]`, `(...)`).
    Block,
    /// A delimited extent introduced by a keyword-like token.
    Declaration,
}

/// A candidate structural unit.
///
/// Confidence is the first-class degradation channel: 1.0 means the
/// extent was fully balanced, anything lower records how it was
/// recovered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseBoundary {
    pub span: Span,
    pub confidence: f32,
    pub kind: BoundaryKind,
}

/// Output of a structural pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralResult {
    /// Detected boundaries, ordered by `span.start`.
    pub boundaries: Vec<ParseBoundary>,
    /// Deepest nesting level seen.
    pub max_depth: u16,
    /// Open delimiters left unmatched at end of input.
    pub unmatched_opens: u32,
    /// Close delimiters with no matching opener.
    pub unmatched_closes: u32,
}

/// Confidence for an extent closed by end-of-input instead of its
/// delimiter.
const UNCLOSED_CONFIDENCE: f32 = 0.5;

/// Confidence for an extent disturbed by a mismatched close.
const MISMATCH_CONFIDENCE: f32 = 0.75;

/// An open delimiter waiting for its close.
struct OpenFrame {
    /// Boundary start: the opener, or the keyword-like token before it.
    start: usize,
    open_char: u8,
    kind: BoundaryKind,
    /// Set when a mismatched close was seen inside this extent.
    degraded: bool,
}

fn closes(open: u8, close: u8) -> bool {
    matches!((open, close), (b'{', b'}') | (b'[', b']') | (b'(', b')'))
}

fn is_keyword_like(token: &Token<'_>) -> bool {
    matches!(token.kind, TokenKind::Keyword | TokenKind::Ident)
}

/// Detect structural boundaries in a token slice.
pub fn parse(tokens: &[Token<'_>]) -> StructuralResult {
    let mut result = StructuralResult::default();
    let mut stack: Vec<OpenFrame> = Vec::new();
    let mut prev_significant: Option<&Token<'_>> = None;
    let mut last_end = 0usize;

    for token in tokens {
        if token.is_trivia() {
            continue;
        }
        last_end = token.span.end;

        if token.is_open_delim() {
            let (start, kind) = match prev_significant {
                Some(prev) if is_keyword_like(prev) => {
                    (prev.span.start, BoundaryKind::Declaration)
                }
                _ => (token.span.start, BoundaryKind::Block),
            };
            stack.push(OpenFrame {
                start,
                open_char: token.text.as_bytes().first().copied().unwrap_or(0),
                kind,
                degraded: false,
            });
            result.max_depth = result.max_depth.max(stack.len() as u16);
        } else if token.is_close_delim() {
            let close_char = token.text.as_bytes().first().copied().unwrap_or(0);
            let top_matches = stack
                .last()
                .map(|frame| closes(frame.open_char, close_char));
            match top_matches {
                Some(true) => {
                    if let Some(frame) = stack.pop() {
                        let confidence = if frame.degraded {
                            MISMATCH_CONFIDENCE
                        } else {
                            1.0
                        };
                        result.boundaries.push(ParseBoundary {
                            span: Span::new(frame.start, token.span.end),
                            confidence,
                            kind: frame.kind,
                        });
                    }
                }
                Some(false) => {
                    // A close that matches nothing; keep the frame open
                    // but remember the disturbance.
                    if let Some(frame) = stack.last_mut() {
                        frame.degraded = true;
                    }
                    result.unmatched_closes += 1;
                }
                None => {
                    result.unmatched_closes += 1;
                }
            }
        }

        prev_significant = Some(token);
    }

    // Anything still open gets closed by end-of-input at half
    // confidence.
    while let Some(frame) = stack.pop() {
        result.unmatched_opens += 1;
        result.boundaries.push(ParseBoundary {
            span: Span::new(frame.start, last_end.max(frame.start)),
            confidence: UNCLOSED_CONFIDENCE,
            kind: frame.kind,
        });
    }

    // Nested extents close inner-first; consumers want source order.
    result
        .boundaries
        .sort_by_key(|b| (b.span.start, b.span.end));
    result
}
