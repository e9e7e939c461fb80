//! Grammar tables
//!
//! A [`Grammar`] is an ordered mapping from token name to the rules
//! that produce it. Order is priority: the tokenizer tries entries
//! front to back. Composition helpers never modify their input, so
//! several languages can be derived from one base table.

use indexmap::IndexMap;

use super::rules::{PatternRule, RuleSet};

/// Ordered token-name → rules table for one language
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    entries: IndexMap<String, RuleSet>,
    /// Registered language whose entries follow this table's own
    rest: Option<String>,
}

impl Grammar {
    /// Create an empty grammar
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the rules for a token name
    pub fn token(mut self, name: &str, rules: impl Into<RuleSet>) -> Self {
        self.set(name, rules);
        self
    }

    /// Builder: append the entries of a registered language at tokenize time
    pub fn with_rest(mut self, language: &str) -> Self {
        self.rest = Some(language.to_string());
        self
    }

    /// Replace the rules for `name` in place, or append a new entry
    pub fn set(&mut self, name: &str, rules: impl Into<RuleSet>) {
        self.entries.insert(name.to_string(), rules.into());
    }

    /// Add one more alternative under `name`
    pub fn push_rule(&mut self, name: &str, rule: PatternRule) {
        match self.entries.get_mut(name) {
            Some(set) => set.push(rule),
            None => self.set(name, rule),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn rest(&self) -> Option<&str> {
        self.rest.as_deref()
    }

    /// Entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSet)> {
        self.entries.iter().map(|(name, rules)| (name.as_str(), rules))
    }

    /// Token names in priority order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive a grammar from `base`
///
/// Entries of `overrides` replace base entries of the same name at their
/// original position; new names are appended. A `rest` on the overrides
/// wins over the base's.
pub fn extend(base: &Grammar, overrides: Grammar) -> Grammar {
    let mut grammar = base.clone();
    for (name, rules) in overrides.entries {
        grammar.entries.insert(name, rules);
    }
    if overrides.rest.is_some() {
        grammar.rest = overrides.rest;
    }
    grammar
}

/// Splice `entries` into `table` immediately before `anchor`
///
/// Names that appear in `entries` move to the splice point. If `anchor`
/// is not in the table the entries are appended.
pub fn insert_before(table: &Grammar, anchor: &str, entries: Grammar) -> Grammar {
    let Grammar {
        entries: mut inserted,
        rest,
    } = entries;

    let mut out = IndexMap::with_capacity(table.len() + inserted.len());
    for (name, rules) in &table.entries {
        if name == anchor {
            out.extend(inserted.drain(..));
        }
        if !out.contains_key(name) && !inserted.contains_key(name) {
            out.insert(name.clone(), rules.clone());
        }
    }
    // Anchor missing: everything left goes at the end
    for (name, rules) in inserted {
        out.insert(name, rules);
    }

    Grammar {
        entries: out,
        rest: rest.or_else(|| table.rest.clone()),
    }
}
