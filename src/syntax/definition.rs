//! Grammars declared in configuration
//!
//! ```toml
//! [[grammar]]
//! name = "ini"
//! aliases = ["cfg"]
//!
//! [[grammar.token]]
//! name = "section"
//! pattern = '(?m)^\[[^\]]+\]'
//!
//! [[grammar.token]]
//! name = "comment"
//! pattern = '(?m)^[;#].*'
//! ```
//!
//! Tokens sharing a name become alternatives, tried in file order.

use serde::Deserialize;

use super::grammar::{self, Grammar};
use super::registry::GrammarRegistry;
use super::rules::PatternRule;
use crate::error::{HighlightError, Result};

/// A grammar as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GrammarDef {
    pub name: String,
    pub aliases: Vec<String>,
    /// Registered language to start from
    pub extends: Option<String>,
    /// With `extends`, splice the tokens in before this entry instead of
    /// overriding same-named entries
    pub insert_before: Option<String>,
    /// Registered language whose entries follow this grammar's own
    pub rest: Option<String>,
    #[serde(rename = "token")]
    pub tokens: Vec<TokenDef>,
}

/// One pattern rule as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TokenDef {
    pub name: String,
    pub pattern: String,
    pub lookbehind: bool,
    pub greedy: bool,
    pub alias: Vec<String>,
    /// Registered language to tokenize the match with
    pub inside: Option<String>,
}

impl TokenDef {
    fn to_rule(&self) -> Result<PatternRule> {
        let mut rule = PatternRule::new(&self.pattern)?;
        rule.lookbehind = self.lookbehind;
        rule.greedy = self.greedy;
        for alias in &self.alias {
            rule = rule.alias(alias);
        }
        if let Some(language) = &self.inside {
            rule = rule.inside_language(language);
        }
        Ok(rule)
    }
}

impl GrammarDef {
    /// Compile the definition against the languages registered so far
    pub fn build(&self, registry: &GrammarRegistry) -> Result<Grammar> {
        if self.name.trim().is_empty() {
            return Err(HighlightError::Message("grammar without a name".to_string()));
        }
        if let Some(token) = self.tokens.iter().find(|t| t.name.trim().is_empty()) {
            return Err(HighlightError::Message(format!(
                "grammar `{}`: token with pattern `{}` has no name",
                self.name, token.pattern
            )));
        }

        let mut own = Grammar::new();
        for token in &self.tokens {
            own.push_rule(&token.name, token.to_rule()?);
        }

        let mut built = match (&self.extends, &self.insert_before) {
            (Some(base), Some(anchor)) => {
                let base = registry
                    .get(base)
                    .ok_or_else(|| HighlightError::UnknownGrammar(base.clone()))?;
                grammar::insert_before(base, anchor, own)
            }
            (Some(base), None) => registry.extend_grammar(base, own)?,
            (None, _) => own,
        };
        if let Some(rest) = &self.rest {
            built = built.with_rest(rest);
        }
        Ok(built)
    }

    /// Build and register under the definition's name and aliases
    pub fn register(&self, registry: &mut GrammarRegistry) -> Result<()> {
        let built = self.build(registry)?;
        let aliases: Vec<&str> = self.aliases.iter().map(String::as_str).collect();
        registry.register_grammar(&self.name, built, &aliases);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tokens::{find_all, text_of};

    fn token(name: &str, pattern: &str) -> TokenDef {
        TokenDef {
            name: name.to_string(),
            pattern: pattern.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_standalone() {
        let mut registry = GrammarRegistry::new();
        let def = GrammarDef {
            name: "ini".to_string(),
            aliases: vec!["cfg".to_string()],
            tokens: vec![token("section", r"(?m)^\[[^\]]+\]"), token("comment", r"(?m)^;.*")],
            ..Default::default()
        };
        def.register(&mut registry).unwrap();

        let source = "[core]\n; note\nx=1";
        let tokens = registry.tokenize(source, "cfg");
        assert_eq!(find_all(&tokens, "section")[0].text(), "[core]");
        assert_eq!(find_all(&tokens, "comment")[0].text(), "; note");
        assert_eq!(text_of(&tokens), source);
    }

    #[test]
    fn test_same_name_tokens_become_alternatives() {
        let registry = GrammarRegistry::new();
        let def = GrammarDef {
            name: "nums".to_string(),
            tokens: vec![token("number", r"0x[0-9a-f]+"), token("number", r"\d+")],
            ..Default::default()
        };
        let built = def.build(&registry).unwrap();
        assert_eq!(built.len(), 1);
        assert_eq!(built.get("number").unwrap().rules().len(), 2);
    }

    #[test]
    fn test_extends_and_insert_before() {
        let registry = GrammarRegistry::with_builtins().unwrap();
        let def = GrammarDef {
            name: "crystal".to_string(),
            extends: Some("ruby".to_string()),
            insert_before: Some("keyword".to_string()),
            tokens: vec![TokenDef {
                alias: vec!["keyword".to_string()],
                ..token("macro", r"\{%|%\}")
            }],
            ..Default::default()
        };
        let built = def.build(&registry).unwrap();
        let names: Vec<_> = built.names().collect();
        let macro_at = names.iter().position(|n| *n == "macro").unwrap();
        assert_eq!(names[macro_at + 1], "keyword");
        // The registered base is untouched
        assert!(!registry.get("ruby").unwrap().contains("macro"));
    }

    #[test]
    fn test_inside_language_reference() {
        let mut registry = GrammarRegistry::with_builtins().unwrap();
        let def = GrammarDef {
            name: "erb".to_string(),
            tokens: vec![TokenDef {
                inside: Some("ruby".to_string()),
                ..token("ruby", r"<%=?[\s\S]*?%>")
            }],
            ..Default::default()
        };
        def.register(&mut registry).unwrap();

        let tokens = registry.tokenize("<p><%= puts %></p>", "erb");
        let block = find_all(&tokens, "ruby")[0];
        assert_eq!(find_all(block.children(), "keyword")[0].text(), "puts");
    }

    #[test]
    fn test_invalid_definitions() {
        let registry = GrammarRegistry::new();
        let unnamed = GrammarDef::default();
        assert!(matches!(unnamed.build(&registry), Err(HighlightError::Message(_))));

        let bad_pattern = GrammarDef {
            name: "bad".to_string(),
            tokens: vec![token("broken", "(unclosed")],
            ..Default::default()
        };
        assert!(matches!(
            bad_pattern.build(&registry),
            Err(HighlightError::InvalidPattern { .. })
        ));

        let missing_base = GrammarDef {
            name: "child".to_string(),
            extends: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            missing_base.build(&registry),
            Err(HighlightError::UnknownGrammar(_))
        ));
    }
}
