//! Grammar registry
//!
//! This module provides the GrammarRegistry that holds named grammars
//! and their aliases, and tokenizes text by language name.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::builtin;
use super::engine::{Limits, Tokenizer};
use super::grammar::{self, Grammar};
use super::tokens::Token;
use crate::error::{HighlightError, Result};

/// Named grammars, looked up by name or alias
#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    /// Registered grammars in registration order
    languages: IndexMap<String, Grammar>,
    /// Alias to language name mapping
    alias_map: HashMap<String, String>,
    /// Work bounds for each tokenize call
    limits: Limits,
}

impl GrammarRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in grammars
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        builtin::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Add or replace a language
    pub fn register_grammar(&mut self, name: &str, grammar: Grammar, aliases: &[&str]) {
        // A real language shadows an alias of the same name
        self.alias_map.remove(name);
        for alias in aliases {
            self.alias_map.insert(alias.to_string(), name.to_string());
        }
        debug!(language = name, entries = grammar.len(), "registered grammar");
        self.languages.insert(name.to_string(), grammar);
    }

    /// Resolve a name or alias to the language name it stands for
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.languages.contains_key(name) {
            return Some(name);
        }
        self.alias_map
            .get(name)
            .filter(|target| self.languages.contains_key(target.as_str()))
            .map(String::as_str)
    }

    /// Get a grammar by name or alias
    pub fn get(&self, name: &str) -> Option<&Grammar> {
        self.canonical_name(name).and_then(|n| self.languages.get(n))
    }

    /// Check if a name or alias is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Aliases registered for a language, sorted
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let mut aliases: Vec<_> = self
            .alias_map
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort();
        aliases
    }

    /// Copy a registered grammar with entries replaced or added
    pub fn extend_grammar(&self, base: &str, overrides: Grammar) -> Result<Grammar> {
        let base = self
            .get(base)
            .ok_or_else(|| HighlightError::UnknownGrammar(base.to_string()))?;
        Ok(grammar::extend(base, overrides))
    }

    /// Splice entries into a registered grammar before `anchor`
    ///
    /// Rules that reference the language by name see the new table.
    pub fn insert_before(&mut self, language: &str, anchor: &str, entries: Grammar) -> Result<()> {
        let name = self
            .canonical_name(language)
            .ok_or_else(|| HighlightError::UnknownGrammar(language.to_string()))?
            .to_string();
        if let Some(table) = self.languages.get_mut(&name) {
            *table = grammar::insert_before(table, anchor, entries);
        }
        Ok(())
    }

    /// List available languages
    pub fn list_languages(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.languages.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Tokenize text with a language
    ///
    /// An unknown language yields the text as one raw token. A call that
    /// runs out of budget or hits a regex failure does the same.
    pub fn tokenize(&self, text: &str, language: &str) -> Vec<Token> {
        match self.get(language) {
            Some(grammar) => self.tokenize_with(text, grammar),
            None => {
                debug!(language, "no grammar registered, returning raw text");
                raw(text)
            }
        }
    }

    /// Tokenize text with a grammar that need not be registered
    pub fn tokenize_with(&self, text: &str, grammar: &Grammar) -> Vec<Token> {
        match self.try_tokenize_with(text, grammar) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = %err, len = text.len(), "tokenizing failed, returning raw text");
                raw(text)
            }
        }
    }

    /// Tokenize text, surfacing budget and regex failures
    pub fn try_tokenize_with(&self, text: &str, grammar: &Grammar) -> Result<Vec<Token>> {
        Tokenizer::new(self, self.limits, text.len()).tokenize(text, grammar)
    }
}

fn raw(text: &str) -> Vec<Token> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Token::text(text)]
    }
}
