//! Layer 2 — the batched incremental parse engine.
//!
//! Pulls bounded batches of tokens from the streaming source, hands
//! them to a pluggable [`ParserInterface`], and accumulates fragments
//! under a memory ceiling. The ceiling is the only thing that aborts a
//! run; batch parse failures are recorded and skipped over.

use std::mem;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::base::Token;
use crate::config::{ConfigError, EngineConfig};
use crate::source::TokenSource;

use super::fragment::{BatchError, Fragment, ParseContext, ParserInterface, PartialResult};
use super::state::ParseState;

/// Estimated bytes per accumulated fragment node.
///
/// Memory accounting is deliberately approximate: what matters is
/// monotone, conservative growth that trips the ceiling before real
/// memory pressure, not exact byte counts.
const AVG_FRAGMENT_COST: usize = 96;

/// Snapshot of a run's progress, queryable at any point including
/// mid-run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsingStats {
    pub state: ParseState,
    /// Byte offset streamed so far.
    pub position: usize,
    /// Total bytes in the streamed region.
    pub total_size: usize,
    pub progress_percent: f32,
    pub memory_used: usize,
    pub memory_limit: usize,
    /// Fragments accumulated and not yet handed to the caller.
    pub pending_fragments: usize,
}

/// Final accounting for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    pub state: ParseState,
    /// Fragments produced, counted recursively.
    pub total_nodes: usize,
    pub total_errors: usize,
    /// Tokens pulled from the streaming source.
    pub tokens_consumed: usize,
    pub memory_used_bytes: usize,
    pub fragments: Vec<Fragment>,
}

/// The batched incremental parser.
pub struct IncrementalEngine<'src> {
    source: TokenSource<'src>,
    parser: Option<Arc<dyn ParserInterface>>,
    config: EngineConfig,
    state: ParseState,
    fragments: Vec<Fragment>,
    errors: Vec<BatchError>,
    total_nodes: usize,
    tokens_consumed: usize,
    batch_index: u32,
}

impl<'src> IncrementalEngine<'src> {
    pub fn new(
        source: TokenSource<'src>,
        parser: Option<Arc<dyn ParserInterface>>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_validated(source, parser, config))
    }

    /// Construction for callers that already validated `config`.
    pub(crate) fn with_validated(
        source: TokenSource<'src>,
        parser: Option<Arc<dyn ParserInterface>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            parser,
            config,
            state: ParseState::Initial,
            fragments: Vec::new(),
            errors: Vec::new(),
            total_nodes: 0,
            tokens_consumed: 0,
            batch_index: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Errors recorded so far, in batch order.
    pub fn errors(&self) -> &[BatchError] {
        &self.errors
    }

    /// Drive the run to a terminal state using the registered parser.
    ///
    /// Without a registered parser this is the fallback mode: every
    /// significant token becomes a leaf fragment.
    pub fn parse_incremental(&mut self) -> ParseResult {
        if self.parser.is_none() {
            return self.parse_token_stream(usize::MAX);
        }
        self.run(usize::MAX, true)
    }

    /// Simplified fallback mode: classify tokens by the trivia
    /// predicate and emit one leaf fragment per significant token,
    /// up to `max_tokens` pulled from the source.
    pub fn parse_token_stream(&mut self, max_tokens: usize) -> ParseResult {
        self.run(max_tokens, false)
    }

    /// Progress snapshot; cheap, callable mid-run.
    pub fn get_stats(&self) -> ParsingStats {
        let range = self.source.range();
        let total_size = range.len();
        let streamed = self.source.position().saturating_sub(range.start);
        let progress = if total_size == 0 {
            100.0
        } else {
            streamed as f32 / total_size as f32 * 100.0
        };
        ParsingStats {
            state: self.state,
            position: self.source.position(),
            total_size,
            progress_percent: progress,
            memory_used: self.memory_used(),
            memory_limit: self.config.memory_limit,
            pending_fragments: self.fragments.len(),
        }
    }

    /// Conservative estimate of the run's working-set size.
    pub fn memory_used(&self) -> usize {
        mem::size_of::<Self>()
            + self.source.memory_stats().buffered_bytes
            + self.total_nodes * AVG_FRAGMENT_COST
    }

    fn run(&mut self, max_tokens: usize, use_parser: bool) -> ParseResult {
        if self.state.is_terminal() {
            // Nothing left to do; report the terminal accounting.
            return self.finish(self.state);
        }

        loop {
            // The ceiling is checked before each batch, and resource
            // exhaustion beats every other outcome, including EOF.
            if self.memory_used() > self.config.memory_limit {
                warn!(
                    used = self.memory_used(),
                    limit = self.config.memory_limit,
                    batch = self.batch_index,
                    "memory ceiling breached; aborting run"
                );
                return self.finish(ParseState::Aborted);
            }

            let budget = self
                .config
                .batch_size
                .min(max_tokens.saturating_sub(self.tokens_consumed));
            if budget == 0 {
                // Token budget exhausted; complete only if it happened
                // to land exactly on end of input.
                let exhausted = self.source.is_eof();
                return self.finish_by_errors(exhausted);
            }

            let batch = self.pull_batch(budget);
            if batch.is_empty() {
                return self.finish_by_errors(true);
            }

            let in_recovery = self.state == ParseState::ErrorRecovery;
            self.state = ParseState::Parsing;
            self.tokens_consumed += batch.len();

            let keep_going = if use_parser {
                self.parse_batch(&batch, in_recovery)
            } else {
                self.classify_batch(&batch);
                true
            };
            if !keep_going {
                // The parser asked to stop; whatever input remains is
                // left unconsumed.
                let exhausted = self.source.is_eof();
                return self.finish_by_errors(exhausted);
            }

            trace!(
                batch = self.batch_index,
                tokens = batch.len(),
                nodes = self.total_nodes,
                "batch processed"
            );
            self.batch_index += 1;
        }
    }

    fn pull_batch(&mut self, budget: usize) -> Vec<Token<'src>> {
        let mut batch = Vec::with_capacity(budget.min(self.config.batch_size));
        while batch.len() < budget {
            match self.source.next() {
                Some(token) => batch.push(token),
                None => break,
            }
        }
        batch
    }

    /// Hand one batch to the language parser, recording a failure
    /// instead of propagating it. Returns whether the run should pull
    /// further batches.
    fn parse_batch(&mut self, batch: &[Token<'src>], in_recovery: bool) -> bool {
        let Some(parser) = self.parser.clone() else {
            self.classify_batch(batch);
            return true;
        };

        let context = ParseContext {
            position: self.source.position(),
            batch_index: self.batch_index,
            in_recovery,
        };

        if !parser.can_continue(batch) {
            self.errors
                .push(BatchError::new("parser cannot continue", batch_span(batch)));
            self.state = ParseState::ErrorRecovery;
            return true;
        }

        let PartialResult {
            fragments,
            consumed_tokens,
            continue_parsing,
            errors,
        } = parser.parse_partial(batch, &context);

        let made_progress = consumed_tokens > 0 || batch.is_empty();
        let failed = !errors.is_empty() || !made_progress;
        for fragment in fragments {
            self.total_nodes += fragment.node_count();
            self.fragments.push(fragment);
        }
        self.errors.extend(errors);

        if failed {
            // Correctness failures are recoverable; only the memory
            // ceiling ends a run early.
            if !made_progress {
                self.errors
                    .push(BatchError::new("parser made no progress", batch_span(batch)));
            }
            self.state = ParseState::ErrorRecovery;
        }
        continue_parsing
    }

    /// Fallback classification: one leaf per significant token.
    fn classify_batch(&mut self, batch: &[Token<'src>]) {
        for token in batch {
            if token.is_trivia() {
                continue;
            }
            self.fragments.push(Fragment::leaf(token.span));
            self.total_nodes += 1;
        }
    }

    fn finish_by_errors(&mut self, input_exhausted: bool) -> ParseResult {
        let state = if !input_exhausted || !self.errors.is_empty() {
            ParseState::PartialSuccess
        } else {
            ParseState::CompleteSuccess
        };
        self.finish(state)
    }

    fn finish(&mut self, state: ParseState) -> ParseResult {
        self.state = state;
        let memory_used_bytes = self.memory_used();
        let result = ParseResult {
            state,
            total_nodes: self.total_nodes,
            total_errors: self.errors.len(),
            tokens_consumed: self.tokens_consumed,
            memory_used_bytes,
            fragments: mem::take(&mut self.fragments),
        };
        debug!(
            state = state.as_str(),
            nodes = result.total_nodes,
            errors = result.total_errors,
            tokens = result.tokens_consumed,
            "detailed parse finished"
        );
        result
    }
}

fn batch_span(batch: &[Token<'_>]) -> crate::base::Span {
    match (batch.first(), batch.last()) {
        (Some(first), Some(last)) => first.span.cover(last.span),
        _ => crate::base::Span::empty(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detailed::fragment::FragmentKind;

    fn engine_for<'src>(
        input: &'src str,
        parser: Option<Arc<dyn ParserInterface>>,
        config: EngineConfig,
    ) -> IncrementalEngine<'src> {
        let source = TokenSource::new(input, None, &config);
        IncrementalEngine::new(source, parser, config).expect("valid test config")
    }

    /// Parser that wraps every batch in one Block fragment.
    struct BlockPerBatch;

    impl ParserInterface for BlockPerBatch {
        fn parse_partial(&self, tokens: &[Token<'_>], _context: &ParseContext) -> PartialResult {
            PartialResult {
                fragments: vec![Fragment::new(FragmentKind::Block, batch_span(tokens))],
                consumed_tokens: tokens.len(),
                continue_parsing: true,
                errors: Vec::new(),
            }
        }

        fn can_continue(&self, _tokens: &[Token<'_>]) -> bool {
            true
        }
    }

    /// Parser that fails every other batch.
    struct FlakyParser;

    impl ParserInterface for FlakyParser {
        fn parse_partial(&self, tokens: &[Token<'_>], context: &ParseContext) -> PartialResult {
            if context.batch_index % 2 == 1 {
                PartialResult {
                    fragments: Vec::new(),
                    consumed_tokens: tokens.len(),
                    continue_parsing: true,
                    errors: vec![BatchError::new("synthetic batch failure", batch_span(tokens))],
                }
            } else {
                BlockPerBatch.parse_partial(tokens, context)
            }
        }

        fn can_continue(&self, _tokens: &[Token<'_>]) -> bool {
            true
        }
    }

    #[test]
    fn test_fallback_leaf_per_token() {
        let mut engine = engine_for("a b c d", None, EngineConfig::default());
        let result = engine.parse_incremental();

        assert_eq!(result.state, ParseState::CompleteSuccess);
        assert_eq!(result.total_nodes, 4);
        assert_eq!(result.tokens_consumed, 4);
        assert!(result.fragments.iter().all(|f| f.kind == FragmentKind::Token));
    }

    #[test]
    fn test_parser_batches_accumulate() {
        let input = "w ".repeat(250);
        let mut engine = engine_for(
            &input,
            Some(Arc::new(BlockPerBatch)),
            EngineConfig::default(),
        );
        let result = engine.parse_incremental();

        assert_eq!(result.state, ParseState::CompleteSuccess);
        // 250 tokens at batch size 100 → 3 batches → 3 block fragments.
        assert_eq!(result.fragments.len(), 3);
        assert_eq!(result.tokens_consumed, 250);
    }

    #[test]
    fn test_batch_failure_recovers() {
        let input = "w ".repeat(250);
        let mut engine = engine_for(&input, Some(Arc::new(FlakyParser)), EngineConfig::default());
        let result = engine.parse_incremental();

        // One of three batches failed: run completes partially.
        assert_eq!(result.state, ParseState::PartialSuccess);
        assert_eq!(result.total_errors, 1);
        assert_eq!(result.fragments.len(), 2);
        assert_eq!(result.tokens_consumed, 250);
    }

    #[test]
    fn test_zero_ceiling_aborts_not_panics() {
        let config = EngineConfig::default().with_memory_limit(0);
        let mut engine = engine_for("a b c", None, config);
        let result = engine.parse_token_stream(usize::MAX);

        assert_eq!(result.state, ParseState::Aborted);
        assert!(engine.get_stats().memory_used > 0);
        assert_eq!(result.tokens_consumed, 0);
    }

    #[test]
    fn test_abort_returns_accumulated_results() {
        let input = "w ".repeat(500);
        // Let a couple of batches through, then trip the ceiling.
        let probe_config = EngineConfig::default().with_batch_size(50);
        let mut probe = engine_for(&input, None, probe_config);
        probe.parse_token_stream(100);
        let after_two_batches = probe.get_stats().memory_used;

        let config = probe_config.with_memory_limit(after_two_batches.saturating_sub(1));
        let mut engine = engine_for(&input, None, config);
        let result = engine.parse_token_stream(usize::MAX);

        assert_eq!(result.state, ParseState::Aborted);
        assert!(result.total_nodes > 0);
        assert!(result.tokens_consumed < 500);
    }

    #[test]
    fn test_max_tokens_partial() {
        let mut engine = engine_for("a b c d e f", None, EngineConfig::default());
        let result = engine.parse_token_stream(3);

        assert_eq!(result.state, ParseState::PartialSuccess);
        assert_eq!(result.tokens_consumed, 3);
    }

    #[test]
    fn test_stats_mid_run_shape() {
        let mut engine = engine_for("a b c", None, EngineConfig::default());
        let stats = engine.get_stats();

        assert_eq!(stats.state, ParseState::Initial);
        assert_eq!(stats.position, 0);
        assert_eq!(stats.total_size, 5);
        assert!(stats.memory_used > 0);

        engine.parse_incremental();
        let done = engine.get_stats();
        assert_eq!(done.progress_percent, 100.0);
        assert!(done.state.is_terminal());
    }

    #[test]
    fn test_invalid_config_is_hard_failure() {
        let config = EngineConfig::default().with_batch_size(0);
        let source = TokenSource::new("a", None, &EngineConfig::default());
        assert!(IncrementalEngine::new(source, None, config).is_err());
    }
}

