//! The fact model: the pipeline's terminal output representation.
//!
//! A fact is an immutable, confidence-scored, generation-stamped
//! assertion about a span of source. Consumers query facts instead of
//! walking a tree; a correction is a new fact at a higher generation,
//! never an edit.

use std::fmt;

use smol_str::SmolStr;

use crate::base::Span;

/// Identifier for one fact, strictly increasing per generator instance.
///
/// Id order is the authoritative "more recent beats older" order within
/// a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub u64);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a fact asserts about its subject span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Generic structural assertion; also the fallback for fragment
    /// kinds with no specific rule.
    IsNode(SmolStr),
    IsFunction,
    HasComplexity,
    HasFieldCount,
}

/// A fact's object value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(SmolStr),
    Atom(SmolStr),
    None,
}

/// One immutable unit of knowledge about the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub id: FactId,
    /// The source range this fact describes.
    pub subject: Span,
    pub predicate: Predicate,
    pub object: Value,
    /// 1.0 for cleanly parsed structure; discounted for recovered or
    /// unrecognized fragments.
    pub confidence: f32,
    /// Which incremental pass produced this fact. Stale facts are
    /// pruned by generation without rescanning.
    pub generation: u32,
}

impl Fact {
    /// Field-wise equality ignoring `id`, the idempotency comparison:
    /// regenerating from the same fragment gives equal facts with fresh
    /// ids.
    pub fn same_content(&self, other: &Fact) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
            && self.confidence == other.confidence
            && self.generation == other.generation
    }
}
