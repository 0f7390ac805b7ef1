//! Foundation types for the strata pipeline.
//!
//! This module provides the types shared by every layer:
//! - [`Span`] - Half-open byte ranges into the source buffer
//! - [`Token`], [`TokenKind`], [`TokenFlags`] - Zero-copy tokens
//! - [`LineIndex`], [`LineCol`] - Byte offset ↔ line/column conversion
//!
//! This module has NO dependencies on other strata modules.

mod line_index;
mod span;
mod token;

pub use line_index::{LineCol, LineIndex};
pub use span::Span;
pub use token::{Token, TokenFlags, TokenKind};
