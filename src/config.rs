//! Configuration file support
//!
//! Loads settings from ~/.typolex.toml (or %USERPROFILE%\.typolex.toml on Windows)
//!
//! Example:
//! ```toml
//! default-language = "markdown"
//! step-budget-per-byte = 256
//! max-depth = 32
//!
//! [language-remap]
//! js = "javascript"
//!
//! [[grammar]]
//! name = "ini"
//! aliases = ["cfg"]
//!
//! [[grammar.token]]
//! name = "section"
//! pattern = '(?m)^\[[^\]]+\]'
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::syntax::definition::GrammarDef;
use crate::syntax::{Limits, DEFAULT_MAX_DEPTH, DEFAULT_STEP_BUDGET_PER_BYTE};

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Language used when none is given and the file extension is unknown
    pub default_language: String,
    /// Tokenizer work allowance per input byte
    pub step_budget_per_byte: usize,
    /// Nesting limit for nested grammars
    pub max_depth: usize,
    /// Extra code fence language renames
    pub language_remap: BTreeMap<String, String>,
    /// User grammars, registered in order after the built-in ones
    #[serde(rename = "grammar")]
    pub grammars: Vec<GrammarDef>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "markdown".to_string(),
            step_budget_per_byte: DEFAULT_STEP_BUDGET_PER_BYTE,
            max_depth: DEFAULT_MAX_DEPTH,
            language_remap: BTreeMap::new(),
            grammars: Vec::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".typolex.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".typolex.toml"))
        }
    }

    /// Load configuration from the default location
    ///
    /// A missing file gives the defaults; so does a malformed one, after
    /// a warning.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Config::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Config::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring config file");
                Config::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        debug!(path = %path.display(), grammars = config.grammars.len(), "loaded config");
        Ok(config)
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Tokenizer limits, clamped to sane ranges
    pub fn limits(&self) -> Limits {
        Limits {
            step_budget_per_byte: self.step_budget_per_byte.clamp(1, 65_536),
            max_depth: self.max_depth.clamp(1, 256),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HighlightError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_language, "markdown");
        assert_eq!(config.limits(), Limits::default());
        assert!(config.language_remap.is_empty());
        assert!(config.grammars.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
            default-language = "ruby"
            max-depth = 8

            [language-remap]
            rails = "ruby"

            [[grammar]]
            name = "ini"
            extends = "clike"

            [[grammar.token]]
            name = "section"
            pattern = '^\['
            greedy = true
            alias = ["important"]
            "#,
        )
        .unwrap();

        assert_eq!(config.default_language, "ruby");
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.step_budget_per_byte, DEFAULT_STEP_BUDGET_PER_BYTE);
        assert_eq!(config.language_remap["rails"], "ruby");

        let grammar = &config.grammars[0];
        assert_eq!(grammar.extends.as_deref(), Some("clike"));
        assert!(grammar.tokens[0].greedy);
        assert!(!grammar.tokens[0].lookbehind);
        assert_eq!(grammar.tokens[0].alias, ["important"]);
    }

    #[test]
    fn test_limits_are_clamped() {
        let config = Config {
            step_budget_per_byte: 0,
            max_depth: 10_000,
            ..Default::default()
        };
        let limits = config.limits();
        assert_eq!(limits.step_budget_per_byte, 1);
        assert_eq!(limits.max_depth, 256);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(matches!(
            Config::parse("max-depth = \"deep\""),
            Err(HighlightError::Config(_))
        ));
    }
}
