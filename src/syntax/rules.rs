//! Pattern rules for syntax highlighting
//!
//! This module defines the rule types a grammar table is built from:
//! a single [`PatternRule`] (regex plus matching flags) and the
//! [`RuleSet`] stored under each token name.

use std::fmt;
use std::sync::Arc;

use fancy_regex::{Regex, RegexBuilder};

use super::grammar::Grammar;
use crate::error::{HighlightError, Result};

/// Backtracking steps a single regex search may take before it errors out
pub const BACKTRACK_LIMIT: usize = 1_000_000;

/// A compiled regular expression together with its source text
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Arc<Regex>,
}

impl Pattern {
    /// Compile a pattern, failing on invalid syntax
    pub fn new(source: &str) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .backtrack_limit(BACKTRACK_LIMIT)
            .build()
            .map_err(|err| HighlightError::invalid_pattern(source, err))?;
        Ok(Self {
            source: source.to_string(),
            regex: Arc::new(regex),
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Grammar used to tokenize the interior of a match
#[derive(Debug, Clone)]
pub enum Inside {
    /// An inline table owned by the rule
    Grammar(Grammar),
    /// A registered language, looked up by name or alias at tokenize time
    Language(String),
    /// Selected entries of a registered language, in the given order
    Entries {
        language: String,
        tokens: Vec<String>,
    },
}

/// A single pattern rule
///
/// Matches a regex pattern; the token name comes from the grammar entry
/// the rule is stored under.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Compiled pattern
    pub pattern: Pattern,
    /// Capture group 1 is leading context and not part of the token
    pub lookbehind: bool,
    /// Search the whole text, re-merging tokens made by earlier rules
    pub greedy: bool,
    /// Nested grammar for the matched text
    pub inside: Option<Inside>,
    /// Secondary type names attached to the token
    pub alias: Vec<String>,
}

impl PatternRule {
    /// Create a new pattern rule
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
            lookbehind: false,
            greedy: false,
            inside: None,
            alias: Vec::new(),
        })
    }

    /// Builder: treat capture group 1 as lookbehind context
    pub fn lookbehind(mut self) -> Self {
        self.lookbehind = true;
        self
    }

    /// Builder: allow matching across earlier tokens
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Builder: add an alias (duplicates are ignored)
    pub fn alias(mut self, alias: &str) -> Self {
        if !self.alias.iter().any(|a| a == alias) {
            self.alias.push(alias.to_string());
        }
        self
    }

    /// Builder: tokenize matches with an inline grammar
    pub fn inside(mut self, grammar: Grammar) -> Self {
        self.inside = Some(Inside::Grammar(grammar));
        self
    }

    /// Builder: tokenize matches with a registered language
    pub fn inside_language(mut self, language: &str) -> Self {
        self.inside = Some(Inside::Language(language.to_string()));
        self
    }

    /// Builder: tokenize matches with some entries of a registered language
    pub fn inside_entries(mut self, language: &str, tokens: &[&str]) -> Self {
        self.inside = Some(Inside::Entries {
            language: language.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    /// Find the first non-empty match in `haystack` starting at `start`
    ///
    /// Returns the byte range of the token, with the lookbehind group
    /// already cut off. Anchors see the whole haystack, so `^` only
    /// matches at `start` when `start` is a line or text start.
    pub fn find_at(
        &self,
        haystack: &str,
        start: usize,
    ) -> std::result::Result<Option<(usize, usize)>, fancy_regex::Error> {
        let mut at = start;
        while at <= haystack.len() {
            let Some(caps) = self.pattern.regex.captures_from_pos(haystack, at)? else {
                return Ok(None);
            };
            let Some(whole) = caps.get(0) else {
                return Ok(None);
            };

            let mut from = whole.start();
            if self.lookbehind {
                if let Some(context) = caps.get(1) {
                    from += context.end() - context.start();
                }
            }
            if whole.end() > from {
                return Ok(Some((from, whole.end())));
            }

            // Zero-width: retry one character further on
            let resume = whole.start().max(at);
            at = resume
                + haystack[resume..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
        Ok(None)
    }
}

/// The rules stored under one token name
#[derive(Debug, Clone)]
pub enum RuleSet {
    Single(PatternRule),
    /// Tried in order
    Alternatives(Vec<PatternRule>),
}

impl RuleSet {
    /// All rules, in priority order
    pub fn rules(&self) -> &[PatternRule] {
        match self {
            RuleSet::Single(rule) => std::slice::from_ref(rule),
            RuleSet::Alternatives(rules) => rules,
        }
    }

    /// Append another alternative
    pub fn push(&mut self, rule: PatternRule) {
        let rules = match std::mem::replace(self, RuleSet::Alternatives(Vec::new())) {
            RuleSet::Single(first) => vec![first, rule],
            RuleSet::Alternatives(mut rules) => {
                rules.push(rule);
                rules
            }
        };
        *self = RuleSet::Alternatives(rules);
    }
}

impl From<PatternRule> for RuleSet {
    fn from(rule: PatternRule) -> Self {
        RuleSet::Single(rule)
    }
}

impl From<Vec<PatternRule>> for RuleSet {
    fn from(rules: Vec<PatternRule>) -> Self {
        RuleSet::Alternatives(rules)
    }
}
