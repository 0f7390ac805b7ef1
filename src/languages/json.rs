//! Built-in JSON language support.
//!
//! The lexer is the reference adapter implementation: a logos-generated
//! token enum mapped onto the shared [`TokenKind`] set, with chunk-local
//! depth tracking. The partial parser is deliberately minimal — objects,
//! arrays, and field keys — enough to exercise the detailed layer and
//! fact generation end to end.

use logos::Logos;
use smol_str::SmolStr;

use crate::base::{Span, Token, TokenKind};
use crate::detailed::{
    BatchError, Fragment, FragmentDetail, FragmentFlags, FragmentKind, ParseContext,
    ParserInterface, PartialResult,
};
use crate::source::LexerAdapter;

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum JsonToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r]+")]
    Whitespace,

    #[token("\n")]
    Newline,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r#""([^"\\\n]|\\.)*""#, priority = 3)]
    Str,

    // A quote that never closes before end of chunk or line.
    #[regex(r#""([^"\\\n]|\\.)*"#, priority = 2)]
    UnterminatedStr,

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,
}

impl JsonToken {
    fn kind(self) -> TokenKind {
        match self {
            Self::Whitespace => TokenKind::Whitespace,
            Self::Newline => TokenKind::Newline,
            Self::Str => TokenKind::Str,
            Self::UnterminatedStr => TokenKind::Error,
            Self::Number => TokenKind::Number,
            Self::True | Self::False => TokenKind::Bool,
            Self::Null => TokenKind::Null,
            Self::LBrace | Self::LBracket => TokenKind::OpenDelim,
            Self::RBrace | Self::RBracket => TokenKind::CloseDelim,
            Self::Comma | Self::Colon => TokenKind::Punct,
        }
    }
}

/// The JSON lexer adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLexer;

impl LexerAdapter for JsonLexer {
    fn tokenize_chunk<'src>(&self, chunk: &'src str, start_offset: usize) -> Vec<Token<'src>> {
        let mut tokens = Vec::with_capacity(chunk.len() / 4 + 1);
        let mut lexer = JsonToken::lexer(chunk);
        let mut depth: u16 = 0;

        while let Some(result) = lexer.next() {
            let range = lexer.span();
            let text = &chunk[range.clone()];
            let span = Span::new(start_offset + range.start, start_offset + range.end);

            let kind = match result {
                Ok(token) => token.kind(),
                // Stray byte the grammar has no rule for.
                Err(()) => TokenKind::Error,
            };

            if kind == TokenKind::CloseDelim {
                depth = depth.saturating_sub(1);
            }
            tokens.push(Token::new(kind, span, text).with_depth(depth));
            if kind == TokenKind::OpenDelim {
                depth = depth.saturating_add(1);
            }
        }
        tokens
    }
}

/// An open container being assembled.
struct ContainerFrame {
    kind: FragmentKind,
    start: usize,
    children: Vec<Fragment>,
    field_count: u32,
    /// A key seen but not yet followed by `:` (objects only).
    pending_key: Option<(Span, SmolStr)>,
}

impl ContainerFrame {
    fn into_fragment(self, end: usize, flags: FragmentFlags) -> Fragment {
        let detail = match self.kind {
            FragmentKind::Object => FragmentDetail::FieldCount(self.field_count),
            _ => FragmentDetail::None,
        };
        let mut fragment = Fragment::new(self.kind, Span::new(self.start, end.max(self.start)))
            .with_detail(detail)
            .with_flags(flags);
        fragment.children = self.children;
        fragment
    }
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

/// Minimal batch-at-a-time JSON parser.
///
/// Containers that close inside the batch become clean fragments;
/// containers still open when the batch ends are emitted
/// `ERROR_RECOVERED`, covering what was seen of them. Scalars at the
/// top level become leaves.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPartialParser;

impl ParserInterface for JsonPartialParser {
    fn parse_partial(&self, tokens: &[Token<'_>], _context: &ParseContext) -> PartialResult {
        let mut result = PartialResult {
            continue_parsing: true,
            consumed_tokens: tokens.len(),
            ..Default::default()
        };
        let mut frames: Vec<ContainerFrame> = Vec::new();
        let mut last_end = 0usize;

        fn push_fragment(
            frames: &mut [ContainerFrame],
            fragment: Fragment,
            out: &mut PartialResult,
        ) {
            match frames.last_mut() {
                Some(frame) => frame.children.push(fragment),
                None => out.fragments.push(fragment),
            }
        }

        for token in tokens {
            if token.is_trivia() {
                continue;
            }
            last_end = token.span.end;

            match token.kind {
                TokenKind::OpenDelim => {
                    let kind = if token.text == "{" {
                        FragmentKind::Object
                    } else {
                        FragmentKind::Array
                    };
                    frames.push(ContainerFrame {
                        kind,
                        start: token.span.start,
                        children: Vec::new(),
                        field_count: 0,
                        pending_key: None,
                    });
                }
                TokenKind::CloseDelim => match frames.pop() {
                    Some(frame) => {
                        let fragment = frame.into_fragment(token.span.end, FragmentFlags::empty());
                        push_fragment(&mut frames, fragment, &mut result);
                    }
                    None => {
                        result
                            .errors
                            .push(BatchError::new("unmatched closing delimiter", token.span));
                    }
                },
                TokenKind::Str => {
                    // The most recent string in an object is a key
                    // candidate; a following colon confirms it. String
                    // values are simply never confirmed.
                    if let Some(frame) = frames.last_mut() {
                        if frame.kind == FragmentKind::Object {
                            frame.pending_key =
                                Some((token.span, SmolStr::new(unquote(token.text))));
                        }
                    }
                }
                TokenKind::Punct if token.text == ":" => {
                    if let Some(frame) = frames.last_mut() {
                        if let Some((key_span, key)) = frame.pending_key.take() {
                            frame
                                .children
                                .push(Fragment::new(FragmentKind::Field, key_span).with_label(key));
                            frame.field_count += 1;
                        }
                    }
                }
                TokenKind::Punct => {}
                TokenKind::Error => {
                    result
                        .errors
                        .push(BatchError::new("malformed JSON lexeme", token.span));
                }
                _ => {
                    if frames.is_empty() {
                        push_fragment(&mut frames, Fragment::leaf(token.span), &mut result);
                    }
                }
            }
        }

        // Containers cut off by the batch boundary: best-effort
        // fragments at reduced standing.
        while let Some(frame) = frames.pop() {
            let fragment = frame.into_fragment(last_end, FragmentFlags::ERROR_RECOVERED);
            match frames.last_mut() {
                Some(parent) => parent.children.push(fragment),
                None => result.fragments.push(fragment),
            }
        }

        result
    }

    fn can_continue(&self, tokens: &[Token<'_>]) -> bool {
        tokens.iter().any(|t| !t.is_trivia())
    }
}
