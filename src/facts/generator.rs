//! Fragment → fact conversion.
//!
//! The generator walks syntax fragments and emits facts, inheriting
//! (and possibly discounting) the producing boundary's confidence. It
//! is a pure producer: no fact storage lives here, and both the id
//! counter and the generation are instance state, so independent
//! pipelines never observe each other.

use smol_str::SmolStr;

use crate::detailed::{Fragment, FragmentDetail, FragmentKind};

use super::fact::{Fact, FactId, Predicate, Value};

/// Confidence multiplier for error-recovered fragments.
const RECOVERED_DISCOUNT: f32 = 0.5;

/// Confidence multiplier for fragment kinds with no specific rule.
const UNRECOGNIZED_DISCOUNT: f32 = 0.8;

/// Converts fragments into generation-stamped facts.
#[derive(Debug)]
pub struct FactGenerator {
    next_id: u64,
    generation: u32,
}

impl Default for FactGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FactGenerator {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            generation: 0,
        }
    }

    /// The generation stamped on facts emitted now.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Start a new incremental pass; facts emitted afterwards carry the
    /// new generation. Returns it.
    pub fn begin_generation(&mut self) -> u32 {
        self.generation += 1;
        self.generation
    }

    /// Walk `fragment` (and descendants, preorder) and emit facts.
    ///
    /// `boundary_confidence` is the confidence of the structural
    /// boundary that produced the fragment; discounts multiply into it.
    pub fn generate(&mut self, fragment: &Fragment, boundary_confidence: f32) -> Vec<Fact> {
        let mut facts = Vec::new();
        self.walk(fragment, boundary_confidence, &mut facts);
        facts
    }

    fn walk(&mut self, fragment: &Fragment, boundary_confidence: f32, out: &mut Vec<Fact>) {
        self.emit(fragment, boundary_confidence, out);
        for child in &fragment.children {
            self.walk(child, boundary_confidence, out);
        }
    }

    fn emit(&mut self, fragment: &Fragment, boundary_confidence: f32, out: &mut Vec<Fact>) {
        // Error recovery is the stronger signal and wins over the
        // unrecognized-kind discount.
        let confidence = if fragment.is_error_recovered() {
            boundary_confidence * RECOVERED_DISCOUNT
        } else if matches!(fragment.kind, FragmentKind::Other(_)) {
            boundary_confidence * UNRECOGNIZED_DISCOUNT
        } else {
            boundary_confidence
        };

        match &fragment.kind {
            FragmentKind::Function => {
                let name = fragment
                    .label
                    .as_ref()
                    .map(|l| Value::Text(l.clone()))
                    .unwrap_or(Value::None);
                out.push(self.fact(fragment, Predicate::IsFunction, name, confidence));
                if let FragmentDetail::Complexity(c) = fragment.detail {
                    out.push(self.fact(
                        fragment,
                        Predicate::HasComplexity,
                        Value::Number(c as f64),
                        confidence,
                    ));
                }
            }
            FragmentKind::Object => {
                out.push(self.node_fact(fragment, "object", confidence));
                let count = match fragment.detail {
                    FragmentDetail::FieldCount(n) => n,
                    _ => fragment.children.len() as u32,
                };
                out.push(self.fact(
                    fragment,
                    Predicate::HasFieldCount,
                    Value::Number(count as f64),
                    confidence,
                ));
            }
            FragmentKind::Array => {
                out.push(self.node_fact(fragment, "array", confidence));
                out.push(self.fact(
                    fragment,
                    Predicate::HasFieldCount,
                    Value::Number(fragment.children.len() as f64),
                    confidence,
                ));
            }
            FragmentKind::Field => {
                let object = fragment
                    .label
                    .as_ref()
                    .map(|l| Value::Text(l.clone()))
                    .unwrap_or(Value::None);
                out.push(self.fact(fragment, Predicate::IsNode(SmolStr::new("field")), object, confidence));
            }
            FragmentKind::Block => {
                out.push(self.node_fact(fragment, "block", confidence));
            }
            FragmentKind::Token => {
                out.push(self.node_fact(fragment, "token", confidence));
            }
            FragmentKind::Other(kind) => {
                // No language rule for this kind: a generic node fact
                // is all that can honestly be asserted.
                out.push(self.fact(
                    fragment,
                    Predicate::IsNode(kind.clone()),
                    Value::Atom(kind.clone()),
                    confidence,
                ));
            }
        }
    }

    fn node_fact(&mut self, fragment: &Fragment, kind: &str, confidence: f32) -> Fact {
        self.fact(
            fragment,
            Predicate::IsNode(SmolStr::new(kind)),
            Value::Atom(SmolStr::new(kind)),
            confidence,
        )
    }

    fn fact(
        &mut self,
        fragment: &Fragment,
        predicate: Predicate,
        object: Value,
        confidence: f32,
    ) -> Fact {
        let id = FactId(self.next_id);
        self.next_id += 1;
        Fact {
            id,
            subject: fragment.span,
            predicate,
            object,
            confidence,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;
    use crate::detailed::FragmentFlags;

    #[test]
    fn test_ids_strictly_increase_across_calls() {
        let mut generator = FactGenerator::new();
        let fragment = Fragment::new(FragmentKind::Block, Span::new(0, 5));

        let first = generator.generate(&fragment, 1.0);
        let second = generator.generate(&fragment, 1.0);

        assert!(first.last().unwrap().id < second.first().unwrap().id);
    }

    #[test]
    fn test_idempotent_except_ids() {
        let mut generator = FactGenerator::new();
        let mut object = Fragment::new(FragmentKind::Object, Span::new(0, 20));
        object
            .children
            .push(Fragment::new(FragmentKind::Field, Span::new(1, 8)).with_label("name"));

        let first = generator.generate(&object, 0.9);
        let second = generator.generate(&object, 0.9);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert!(a.same_content(b));
            assert_ne!(a.id, b.id);
        }
    }

    #[test]
    fn test_recovered_discount_is_exactly_half() {
        let mut generator = FactGenerator::new();
        let fragment = Fragment::new(FragmentKind::Block, Span::new(0, 4))
            .with_flags(FragmentFlags::ERROR_RECOVERED);

        let facts = generator.generate(&fragment, 0.9);
        assert_eq!(facts[0].confidence, 0.9 * RECOVERED_DISCOUNT);
    }

    #[test]
    fn test_unrecognized_kind_discount_and_fallback() {
        let mut generator = FactGenerator::new();
        let fragment = Fragment::new(
            FragmentKind::Other(SmolStr::new("mystery")),
            Span::new(2, 9),
        );

        let facts = generator.generate(&fragment, 1.0);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].predicate, Predicate::IsNode(SmolStr::new("mystery")));
        assert_eq!(facts[0].confidence, UNRECOGNIZED_DISCOUNT);
    }

    #[test]
    fn test_recovered_beats_unrecognized() {
        let mut generator = FactGenerator::new();
        let fragment = Fragment::new(FragmentKind::Other(SmolStr::new("odd")), Span::new(0, 3))
            .with_flags(FragmentFlags::ERROR_RECOVERED);

        let facts = generator.generate(&fragment, 1.0);
        assert_eq!(facts[0].confidence, RECOVERED_DISCOUNT);
    }

    #[test]
    fn test_object_field_count_from_children() {
        let mut generator = FactGenerator::new();
        let mut object = Fragment::new(FragmentKind::Object, Span::new(0, 30));
        for i in 0..3 {
            object
                .children
                .push(Fragment::new(FragmentKind::Field, Span::new(i * 5 + 1, i * 5 + 4)));
        }

        let facts = generator.generate(&object, 1.0);
        let count = facts
            .iter()
            .find(|f| f.predicate == Predicate::HasFieldCount)
            .unwrap();
        assert_eq!(count.object, Value::Number(3.0));
        // Children produce their own facts after the parent's.
        assert_eq!(facts.len(), 2 + 3);
    }

    #[test]
    fn test_generation_stamps() {
        let mut generator = FactGenerator::new();
        let fragment = Fragment::leaf(Span::new(0, 1));

        assert_eq!(generator.generate(&fragment, 1.0)[0].generation, 0);
        assert_eq!(generator.begin_generation(), 1);
        assert_eq!(generator.generate(&fragment, 1.0)[0].generation, 1);
    }

    #[test]
    fn test_function_facts() {
        let mut generator = FactGenerator::new();
        let fragment = Fragment::new(FragmentKind::Function, Span::new(0, 40))
            .with_label("render")
            .with_detail(FragmentDetail::Complexity(7));

        let facts = generator.generate(&fragment, 1.0);
        assert_eq!(facts[0].predicate, Predicate::IsFunction);
        assert_eq!(facts[0].object, Value::Text(SmolStr::new("render")));
        assert_eq!(facts[1].predicate, Predicate::HasComplexity);
        assert_eq!(facts[1].object, Value::Number(7.0));
    }
}
