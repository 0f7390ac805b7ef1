//! Pipeline tunables.
//!
//! All data-dependent anomalies in this crate degrade into confidence
//! scores, error counts, or terminal states. Invalid configuration is
//! the one exception: it is a programmer error and fails hard at
//! construction, before any input is touched.

use thiserror::Error;

/// Default chunk size for the streaming token source, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How far the chunker searches backward for a safe split point.
///
/// Hard-bounded: a lexeme longer than this window gets cut mid-lexeme
/// (a documented limitation, never an error). Raising this trades
/// per-chunk work for fewer unsafe cuts; an unbounded search would
/// reintroduce unbounded work per chunk and is deliberately not offered.
pub const DEFAULT_SEARCH_WINDOW: usize = 256;

/// Default number of tokens handed to the detailed parser per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default memory ceiling for a detailed-parse run, in bytes.
pub const DEFAULT_MEMORY_LIMIT: usize = 4 * 1024 * 1024;

/// Invalid configuration. The only hard failure this crate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("chunk size must be non-zero")]
    ZeroChunkSize,
    #[error("batch size must be non-zero")]
    ZeroBatchSize,
    #[error("search window ({window}) must not exceed chunk size ({chunk_size})")]
    WindowExceedsChunk { window: usize, chunk_size: usize },
}

/// Tunables for one pipeline or engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bytes of source loaded per chunk by the streaming token source.
    pub chunk_size: usize,
    /// Backward search window for safe chunk split points, in bytes.
    pub search_window: usize,
    /// Tokens per detailed-parse batch.
    pub batch_size: usize,
    /// Memory ceiling for a detailed-parse run, in bytes. Breaching it
    /// aborts the run; it never panics.
    pub memory_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            search_window: DEFAULT_SEARCH_WINDOW,
            batch_size: DEFAULT_BATCH_SIZE,
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.search_window > self.chunk_size {
            return Err(ConfigError::WindowExceedsChunk {
                window: self.search_window,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        // Keep small test configs valid without a second builder call.
        self.search_window = self.search_window.min(chunk_size);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_memory_limit(mut self, memory_limit: usize) -> Self {
        self.memory_limit = memory_limit;
        self
    }
}
