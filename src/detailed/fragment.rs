//! Syntax fragments and the pluggable detailed-parser seam.
//!
//! Fragments are the detailed layer's output: partial, best-effort
//! structure over a token batch. They own no source text — just spans
//! and small labels — so the engine can accumulate them under a memory
//! ceiling without tying their lifetime to the buffer.

use bitflags::bitflags;
use smol_str::SmolStr;

use crate::base::{Span, Token};

/// Classification of a syntax fragment.
///
/// The built-in kinds carry language-specific fact rules; anything a
/// language parser invents beyond them travels as `Other` and falls
/// back to generic fact generation at reduced confidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Function,
    Block,
    Object,
    Array,
    Field,
    /// A single-token leaf, the fallback mode's only product.
    Token,
    Other(SmolStr),
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FragmentFlags: u8 {
        /// Produced while recovering from a parse failure; fact
        /// confidence is halved downstream.
        const ERROR_RECOVERED = 1 << 0;
    }
}

impl Default for FragmentFlags {
    fn default() -> Self {
        FragmentFlags::empty()
    }
}

/// Per-kind payload measured by the producing parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentDetail {
    None,
    /// Branching estimate for function-like fragments.
    Complexity(u32),
    /// Member count for object-like fragments.
    FieldCount(u32),
}

/// A partial syntax fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub span: Span,
    pub flags: FragmentFlags,
    /// A short name where the language has one (a field key, a
    /// function name).
    pub label: Option<SmolStr>,
    pub detail: FragmentDetail,
    pub children: Vec<Fragment>,
}

impl Fragment {
    pub fn new(kind: FragmentKind, span: Span) -> Self {
        Self {
            kind,
            span,
            flags: FragmentFlags::empty(),
            label: None,
            detail: FragmentDetail::None,
            children: Vec::new(),
        }
    }

    /// A single-token leaf.
    pub fn leaf(span: Span) -> Self {
        Self::new(FragmentKind::Token, span)
    }

    pub fn with_label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_detail(mut self, detail: FragmentDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_flags(mut self, flags: FragmentFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_error_recovered(&self) -> bool {
        self.flags.contains(FragmentFlags::ERROR_RECOVERED)
    }

    /// This fragment plus all descendants.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Fragment::node_count)
            .sum::<usize>()
    }
}

/// A recoverable problem found while parsing one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub message: String,
    pub span: Span,
}

impl BatchError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Context handed to the parser with each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseContext {
    /// Byte offset the engine has streamed up to.
    pub position: usize,
    /// Zero-based index of this batch within the run.
    pub batch_index: u32,
    /// Whether the previous batch failed.
    pub in_recovery: bool,
}

/// Result of parsing one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialResult {
    pub fragments: Vec<Fragment>,
    /// How many of the batch's tokens the parser consumed. A parser
    /// that consumes nothing fails the batch (the engine must make
    /// progress).
    pub consumed_tokens: usize,
    /// False tells the engine to stop pulling batches.
    pub continue_parsing: bool,
    pub errors: Vec<BatchError>,
}

/// A language-specific detailed parser.
///
/// Absence is a legal configuration: without one, the engine falls back
/// to `parse_token_stream`, which emits one leaf fragment per
/// significant token. Like the lexer seam, dynamic dispatch stops here.
pub trait ParserInterface: Send + Sync {
    /// Parse one batch of tokens into fragments. Failures are reported
    /// through `errors`, never panics; the engine records them and
    /// keeps going.
    fn parse_partial(&self, tokens: &[Token<'_>], context: &ParseContext) -> PartialResult;

    /// Whether the parser can make progress on these tokens.
    fn can_continue(&self, tokens: &[Token<'_>]) -> bool;
}
