//! Layer 0 substrate: the streaming token source.
//!
//! Delivers tokens for inputs of arbitrary size without holding the
//! whole tokenized result in memory:
//! - [`TokenSource`] - chunked, pull-based iterator with peek/reset
//! - [`LexerAdapter`] - the pluggable per-language tokenizer seam
//! - [`WhitespaceLexer`] - fallback tokenization when no adapter exists
//! - [`MemoryStats`] - buffer instrumentation, queryable at any time

mod adapter;
mod chunk;
mod fallback;
mod stream;

pub use adapter::LexerAdapter;
pub use chunk::{ChunkCut, chunk_end, floor_char_boundary};
pub use fallback::{MAX_TOKENS_PER_CHUNK, WhitespaceLexer, tokenize_whitespace};
pub use stream::{MemoryStats, TokenSource};
