//! Error types for typolex

use thiserror::Error;

/// Result type alias for typolex operations
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Highlighter error types
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("No such grammar: {0}")]
    UnknownGrammar(String),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Regex failed while matching `{token}`: {source}")]
    Regex {
        token: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("Tokenizer step budget of {0} exhausted")]
    BudgetExceeded(usize),

    #[error("{0}")]
    Message(String),
}

impl HighlightError {
    /// Build an [`HighlightError::InvalidPattern`] for a pattern source.
    pub fn invalid_pattern(pattern: &str, source: fancy_regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        }
    }
}
