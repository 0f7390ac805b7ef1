//! Layer 2 — detailed, incremental parsing in bounded batches.
//!
//! - [`IncrementalEngine`] - batch-driven parse loop with a memory ceiling
//! - [`ParserInterface`] - the pluggable per-language parser seam
//! - [`Fragment`] - partial syntax structure handed to fact generation
//! - [`ParseState`] - the observable run state machine
//!
//! The engine's failure semantics are the crate's central invariant:
//! batch parse failures are recorded and skipped, and only a memory
//! ceiling breach terminates a run early.

mod engine;
mod fragment;
mod state;

pub use engine::{IncrementalEngine, ParseResult, ParsingStats};
pub use fragment::{
    BatchError, Fragment, FragmentDetail, FragmentFlags, FragmentKind, ParseContext,
    ParserInterface, PartialResult,
};
pub use state::ParseState;
