//! Language resolution.
//!
//! Maps a language identifier — from a file extension or content
//! sniffing — to the adapter bundle the pipeline consumes. The core
//! layers depend only on the two adapter contracts, never on a concrete
//! language.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::detailed::ParserInterface;
use crate::source::LexerAdapter;

use super::json::{JsonLexer, JsonPartialParser};

/// The adapters registered for one language.
///
/// A missing parser is a legal configuration: the detailed layer falls
/// back to token-stream mode. Formatters consume the fact stream and
/// live outside the core, so they take no slot here.
#[derive(Clone)]
pub struct LanguageBundle {
    pub lexer: Arc<dyn LexerAdapter>,
    pub parser: Option<Arc<dyn ParserInterface>>,
}

impl LanguageBundle {
    pub fn new(lexer: Arc<dyn LexerAdapter>) -> Self {
        Self {
            lexer,
            parser: None,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn ParserInterface>) -> Self {
        self.parser = Some(parser);
        self
    }
}

/// Registry of known languages.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    /// Registration order is iteration order.
    languages: IndexMap<SmolStr, LanguageBundle>,
    /// Lowercased extension → language id.
    extensions: FxHashMap<SmolStr, SmolStr>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in languages registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            "json",
            &["json"],
            LanguageBundle::new(Arc::new(JsonLexer)).with_parser(Arc::new(JsonPartialParser)),
        );
        registry
    }

    pub fn register(&mut self, id: &str, extensions: &[&str], bundle: LanguageBundle) {
        let id = SmolStr::new(id);
        for ext in extensions {
            self.extensions
                .insert(SmolStr::new(ext.to_ascii_lowercase()), id.clone());
        }
        self.languages.insert(id, bundle);
    }

    pub fn get(&self, id: &str) -> Option<&LanguageBundle> {
        self.languages.get(id)
    }

    pub fn by_extension(&self, ext: &str) -> Option<&LanguageBundle> {
        let id = self.extensions.get(ext.to_ascii_lowercase().as_str())?;
        self.languages.get(id)
    }

    /// Resolve a language from a path, falling back to content
    /// sniffing when the extension is unknown.
    pub fn detect(&self, path: &str, content: &str) -> Option<(&str, &LanguageBundle)> {
        if let Some(ext) = path.rsplit('.').next().filter(|e| *e != path) {
            if let Some(id) = self.extensions.get(ext.to_ascii_lowercase().as_str()) {
                return self.languages.get_key_value(id).map(|(k, v)| (k.as_str(), v));
            }
        }
        self.sniff(content)
    }

    /// Registered language ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(SmolStr::as_str)
    }

    fn sniff(&self, content: &str) -> Option<(&str, &LanguageBundle)> {
        let first = content.trim_start().as_bytes().first()?;
        if matches!(first, b'{' | b'[') {
            return self
                .languages
                .get_key_value("json")
                .map(|(k, v)| (k.as_str(), v));
        }
        None
    }
}
