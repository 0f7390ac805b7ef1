//! Language registry and built-in language support.
//!
//! - [`LanguageRegistry`], [`LanguageBundle`] - id/extension resolution
//! - [`JsonLexer`], [`JsonPartialParser`] - the built-in JSON adapters,
//!   which double as the reference implementations of the two adapter
//!   contracts

mod json;
mod registry;

pub use json::{JsonLexer, JsonPartialParser};
pub use registry::{LanguageBundle, LanguageRegistry};
