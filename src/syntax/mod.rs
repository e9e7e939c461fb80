//! Syntax highlighting module
//!
//! This module provides the grammar-driven tokenizer and everything
//! around it:
//! - Grammar tables and pattern rules
//! - The tokenizer engine and the grammar registry
//! - Hooks, built-in languages and renderers

pub mod builtin;
pub mod definition;
mod engine;
pub mod grammar;
mod highlighter;
pub mod hooks;
mod registry;
pub mod render;
pub mod rules;
mod style;
pub mod tokens;

pub use definition::{GrammarDef, TokenDef};
pub use engine::{Limits, DEFAULT_MAX_DEPTH, DEFAULT_STEP_BUDGET_PER_BYTE};
pub use grammar::Grammar;
pub use highlighter::{Highlighter, LazyLoader};
pub use hooks::{Hook, HookError, HookPoint, Hooks};
pub use registry::GrammarRegistry;
pub use render::{dump_tree, to_html, AnsiRenderer};
pub use rules::{Inside, PatternRule, RuleSet};
pub use style::{Color, Style, Theme};
pub use tokens::{Token, TokenContent, TokenNode};
