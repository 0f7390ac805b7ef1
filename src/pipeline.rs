//! The pipeline facade.
//!
//! `Pipeline` owns all mutable state — configuration, the language
//! bundle, the fact generator with its id counter and generation — and
//! runs the stratified layers over a buffer or a viewport of it. Each
//! run is one generation: facts from earlier runs are identifiable (and
//! prunable) by generation alone.
//!
//! Running two pipelines over two different buffers concurrently is
//! safe by construction; nothing is shared between instances. Two
//! pipelines over the *same* evolving buffer must be serialized by the
//! caller.

use tracing::debug;

use crate::base::{Span, Token};
use crate::config::{ConfigError, EngineConfig};
use crate::detailed::{IncrementalEngine, ParseResult};
use crate::facts::{Fact, FactGenerator};
use crate::languages::LanguageBundle;
use crate::lexical::widen_to_safe_bounds;
use crate::source::TokenSource;
use crate::structural::{self, ParseBoundary, StructuralResult};

/// Severity of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Hint,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// A problem surfaced by a run. Diagnostics report; they never abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span, severity: Severity) -> Self {
        Self {
            message: message.into(),
            span,
            severity,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The generation stamped on this run's facts.
    pub generation: u32,
    /// The fact stream, in fragment source order.
    pub facts: Vec<Fact>,
    /// Structural boundaries, ordered by start.
    pub boundaries: Vec<ParseBoundary>,
    /// Detailed-parse accounting, including the terminal state.
    pub parse: ParseResult,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisOutcome {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }
}

/// Owns the layers and drives them over source text.
pub struct Pipeline {
    config: EngineConfig,
    bundle: Option<LanguageBundle>,
    generator: FactGenerator,
}

impl Pipeline {
    /// Fails only on invalid configuration; every later anomaly
    /// degrades instead.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            bundle: None,
            generator: FactGenerator::new(),
        })
    }

    /// Attach a language bundle. Without one, the fallback tokenizer
    /// and token-stream parse mode apply.
    pub fn with_bundle(mut self, bundle: LanguageBundle) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The generation the next run will carry.
    pub fn next_generation(&self) -> u32 {
        self.generator.generation() + 1
    }

    /// Run all layers over the whole buffer.
    pub fn analyze(&mut self, source: &str) -> AnalysisOutcome {
        self.run(source, Span::new(0, source.len()))
    }

    /// Re-run the layers for a viewport after an edit. Only the widened
    /// viewport is lexed and parsed; facts regenerate for structures
    /// found inside it, at a fresh generation so facts from earlier
    /// runs can be pruned where they overlap.
    pub fn analyze_viewport(&mut self, source: &str, viewport: Span) -> AnalysisOutcome {
        let region = widen_to_safe_bounds(source, viewport, self.config.search_window);
        self.run(source, region)
    }

    fn run(&mut self, source: &str, region: Span) -> AnalysisOutcome {
        let generation = self.generator.begin_generation();
        let adapter = self.bundle.as_ref().map(|b| b.lexer.clone());
        let parser = self.bundle.as_ref().and_then(|b| b.parser.clone());

        // Layer 0/1: stream the region once, keeping the token list
        // only for the structural pass and then dropping it.
        let mut stream = TokenSource::for_range(source, region, adapter.clone(), &self.config);
        let mut tokens: Vec<Token<'_>> = Vec::new();
        let mut diagnostics = Vec::new();
        while let Some(token) = stream.next() {
            if token.is_error() {
                diagnostics.push(Diagnostic::new(
                    format!("malformed token `{}`", token.text),
                    token.span,
                    Severity::Error,
                ));
            }
            tokens.push(token);
        }

        let StructuralResult {
            boundaries,
            max_depth,
            unmatched_opens,
            unmatched_closes,
        } = structural::parse(&tokens);
        drop(tokens);
        if unmatched_opens + unmatched_closes > 0 {
            diagnostics.push(Diagnostic::new(
                format!(
                    "unbalanced delimiters: {unmatched_opens} unclosed, {unmatched_closes} unmatched"
                ),
                region,
                Severity::Warning,
            ));
        }

        // Layer 2: a fresh stream over the same region, batched under
        // the memory ceiling.
        let stream = TokenSource::for_range(source, region, adapter, &self.config);
        let mut engine = IncrementalEngine::with_validated(stream, parser, self.config);
        let parse = engine.parse_incremental();
        for error in engine.errors() {
            diagnostics.push(Diagnostic::new(
                error.message.clone(),
                error.span,
                Severity::Error,
            ));
        }

        // Facts inherit the confidence of the tightest boundary around
        // their fragment.
        let mut facts = Vec::new();
        for fragment in &parse.fragments {
            let confidence = enclosing_confidence(&boundaries, fragment.span);
            facts.extend(self.generator.generate(fragment, confidence));
        }

        debug!(
            generation,
            region = %region,
            facts = facts.len(),
            boundaries = boundaries.len(),
            max_depth,
            state = parse.state.as_str(),
            "analysis pass finished"
        );

        AnalysisOutcome {
            generation,
            facts,
            boundaries,
            parse,
            diagnostics,
        }
    }
}

/// Confidence of the smallest boundary containing `span`, or 1.0 when
/// nothing encloses it (top-level structure is not a recovery case).
fn enclosing_confidence(boundaries: &[ParseBoundary], span: Span) -> f32 {
    boundaries
        .iter()
        .filter(|b| b.span.contains(span))
        .min_by_key(|b| b.span.len())
        .map(|b| b.confidence)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_confidence_picks_tightest() {
        let boundaries = vec![
            ParseBoundary {
                span: Span::new(0, 100),
                confidence: 0.5,
                kind: crate::structural::BoundaryKind::Block,
            },
            ParseBoundary {
                span: Span::new(10, 40),
                confidence: 0.75,
                kind: crate::structural::BoundaryKind::Block,
            },
        ];

        assert_eq!(enclosing_confidence(&boundaries, Span::new(12, 20)), 0.75);
        assert_eq!(enclosing_confidence(&boundaries, Span::new(50, 60)), 0.5);
        assert_eq!(enclosing_confidence(&boundaries, Span::new(200, 210)), 1.0);
    }

    #[test]
    fn test_generation_increments_per_run() {
        let mut pipeline = Pipeline::new(EngineConfig::default()).unwrap();

        let first = pipeline.analyze("a b c");
        let second = pipeline.analyze("a b c");
        assert_eq!(second.generation, first.generation + 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default().with_batch_size(0);
        assert!(Pipeline::new(config).is_err());
    }
}
