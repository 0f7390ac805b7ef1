//! # strata
//!
//! Stratified incremental source analysis for editor-speed tooling:
//! streaming lexing, structural boundary detection, batched detailed
//! parsing, and an immutable fact stream as the terminal output.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! pipeline   → facade: runs the layers, owns generations, diagnostics
//!   ↓
//! languages  → registry + built-in JSON adapters
//!   ↓
//! facts      → Fact model, FactGenerator (confidence discounting)
//!   ↓
//! detailed   → Layer 2: batched IncrementalEngine, memory ceiling
//!   ↓
//! structural → Layer 1: delimiter-depth boundaries with confidence
//!   ↓
//! lexical    → Layer 0: viewport tokenization
//!   ↓
//! source     → streaming TokenSource, chunking, LexerAdapter seam
//!   ↓
//! base       → primitives (Span, Token, LineIndex)
//! ```
//!
//! ## Design invariants
//!
//! - Tokens are zero-copy views into the source buffer; the buffer must
//!   outlive every token, boundary, and fact produced from it.
//! - Data-dependent anomalies degrade into confidence scores, error
//!   counts, or terminal states. Invalid configuration is the only hard
//!   failure; the memory ceiling is the only thing that aborts a run.
//! - All counters (fact ids, generations) are instance state, so
//!   pipelines over different buffers are independent by construction.

// ============================================================================
// MODULES (dependency order: base → source → lexical → structural →
// detailed → facts → languages → pipeline)
// ============================================================================

/// Foundation types: Span, Token, LineIndex
pub mod base;

/// Tunables and the configuration error type
pub mod config;

/// Streaming token source: chunking, adapters, fallback tokenizer
pub mod source;

/// Layer 0: viewport lexing
pub mod lexical;

/// Layer 1: structural boundary detection
pub mod structural;

/// Layer 2: batched incremental parsing under a memory ceiling
pub mod detailed;

/// Fact model and generator
pub mod facts;

/// Language registry and built-in JSON support
pub mod languages;

/// The facade tying the layers together
pub mod pipeline;

// Re-export the types nearly every consumer touches
pub use base::{LineCol, LineIndex, Span, Token, TokenFlags, TokenKind};
pub use config::{ConfigError, EngineConfig};
pub use detailed::{IncrementalEngine, ParseResult, ParseState, ParsingStats};
pub use facts::{Fact, FactGenerator, FactId, Predicate, Value};
pub use pipeline::{AnalysisOutcome, Diagnostic, Pipeline, Severity};
pub use source::{LexerAdapter, TokenSource};
pub use structural::{BoundaryKind, ParseBoundary, StructuralResult};
