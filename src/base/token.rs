//! The token representation shared by every layer.
//!
//! Tokens are zero-copy: `text` is always a slice of the original source
//! buffer, so the buffer must outlive every token produced from it. The
//! lifetime parameter threads that requirement through the whole
//! pipeline.

use bitflags::bitflags;

use super::span::Span;

/// Language-agnostic token classification.
///
/// Lexer adapters map their own token enums onto these kinds so the
/// structural and detailed layers can stay language-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Keyword,
    Number,
    Str,
    Bool,
    Null,
    /// Punctuation that is not a delimiter (`,`, `:`, operators).
    Punct,
    OpenDelim,
    CloseDelim,
    Comment,
    Whitespace,
    Newline,
    /// A malformed lexeme. Lexing never fails; it degrades to this.
    Error,
}

impl TokenKind {
    /// Trivia does not participate in structural or fact-level analysis.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Self::Whitespace | Self::Newline | Self::Comment)
    }

    /// The flags implied by this kind alone.
    pub fn base_flags(&self) -> TokenFlags {
        match self {
            Self::Whitespace | Self::Comment => TokenFlags::TRIVIA,
            Self::Newline => TokenFlags::TRIVIA | TokenFlags::EOL,
            Self::OpenDelim => TokenFlags::OPEN_DELIM,
            Self::CloseDelim => TokenFlags::CLOSE_DELIM,
            Self::Error => TokenFlags::ERROR,
            _ => TokenFlags::empty(),
        }
    }
}

bitflags! {
    /// Per-token metadata consumed by the structural layer and by
    /// diagnostics collection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u16 {
        /// Whitespace or comment; skipped by Layers 1 and 2.
        const TRIVIA = 1 << 0;
        /// Malformed lexeme, surfaced later as a diagnostic.
        const ERROR = 1 << 1;
        const OPEN_DELIM = 1 << 2;
        const CLOSE_DELIM = 1 << 3;
        /// Inserted during error recovery; has no source text of its own.
        const SYNTHETIC = 1 << 4;
        /// Ends a line.
        const EOL = 1 << 5;
    }
}

impl Default for TokenFlags {
    fn default() -> Self {
        TokenFlags::empty()
    }
}

/// A single token, borrowing its text from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub span: Span,
    pub kind: TokenKind,
    pub text: &'src str,
    /// Nesting depth as seen by the producing adapter. Adapters are
    /// stateless per chunk, so this is chunk-local and informational;
    /// the structural layer recomputes the authoritative depth from
    /// delimiter flags.
    pub depth: u16,
    pub flags: TokenFlags,
}

impl<'src> Token<'src> {
    /// Build a token with the flags implied by its kind.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self {
            span,
            kind,
            text,
            depth: 0,
            flags: kind.base_flags(),
        }
    }

    pub fn with_depth(mut self, depth: u16) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_trivia(&self) -> bool {
        self.flags.contains(TokenFlags::TRIVIA)
    }

    pub fn is_error(&self) -> bool {
        self.flags.contains(TokenFlags::ERROR)
    }

    pub fn is_open_delim(&self) -> bool {
        self.flags.contains(TokenFlags::OPEN_DELIM)
    }

    pub fn is_close_delim(&self) -> bool {
        self.flags.contains(TokenFlags::CLOSE_DELIM)
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}
