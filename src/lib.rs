//! typolex - grammar-driven syntax highlighting
//!
//! Text is split into a tree of typed tokens by ordered, possibly
//! recursive pattern grammars, post-processed by hooks and rendered to
//! HTML or a terminal. Markdown and Ruby are built in; more grammars can
//! be declared in the config file.

pub mod config;
pub mod error;
pub mod syntax;

pub use config::Config;
pub use error::{HighlightError, Result};
pub use syntax::{GrammarRegistry, Highlighter, Token};
