//! Hook pipeline
//!
//! Named extension points run around tokenization and rendering. Each
//! point holds a list of callbacks that receive a typed, mutable
//! context. Callbacks run in registration order; one that fails or
//! panics is logged and skipped, the rest still run.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

use super::highlighter::Highlighter;
use super::tokens::Token;

/// Error returned by a hook callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

pub type HookResult = std::result::Result<(), HookError>;

/// Extension points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeTokenize,
    AfterTokenize,
    Wrap,
}

impl HookPoint {
    pub fn name(&self) -> &'static str {
        match self {
            HookPoint::BeforeTokenize => "before-tokenize",
            HookPoint::AfterTokenize => "after-tokenize",
            HookPoint::Wrap => "wrap",
        }
    }
}

/// Context for `before-tokenize`: the source and language may be rewritten
pub struct BeforeTokenize<'a> {
    pub code: String,
    pub language: String,
    pub highlighter: &'a Highlighter,
}

/// Context for `after-tokenize`: the freshly built token tree
pub struct AfterTokenize<'a> {
    pub code: &'a str,
    pub language: &'a str,
    pub tokens: &'a mut Vec<Token>,
    pub highlighter: &'a Highlighter,
}

/// Context for `wrap`: one typed token about to be serialized
pub struct Wrap<'a> {
    /// Token name
    pub kind: &'a str,
    /// Already rendered inner markup
    pub content: String,
    /// Element name, `span` by default
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// Language the enclosing tree was tokenized with
    pub language: &'a str,
    pub highlighter: &'a Highlighter,
}

type BeforeTokenizeFn = dyn Fn(&mut BeforeTokenize<'_>) -> HookResult + Send + Sync;
type AfterTokenizeFn = dyn Fn(&mut AfterTokenize<'_>) -> HookResult + Send + Sync;
type WrapFn = dyn Fn(&mut Wrap<'_>) -> HookResult + Send + Sync;

/// A callback bound to its extension point
pub enum Hook {
    BeforeTokenize(Box<BeforeTokenizeFn>),
    AfterTokenize(Box<AfterTokenizeFn>),
    Wrap(Box<WrapFn>),
}

impl Hook {
    pub fn before_tokenize<F>(callback: F) -> Self
    where
        F: Fn(&mut BeforeTokenize<'_>) -> HookResult + Send + Sync + 'static,
    {
        Hook::BeforeTokenize(Box::new(callback))
    }

    pub fn after_tokenize<F>(callback: F) -> Self
    where
        F: Fn(&mut AfterTokenize<'_>) -> HookResult + Send + Sync + 'static,
    {
        Hook::AfterTokenize(Box::new(callback))
    }

    pub fn wrap<F>(callback: F) -> Self
    where
        F: Fn(&mut Wrap<'_>) -> HookResult + Send + Sync + 'static,
    {
        Hook::Wrap(Box::new(callback))
    }

    pub fn point(&self) -> HookPoint {
        match self {
            Hook::BeforeTokenize(_) => HookPoint::BeforeTokenize,
            Hook::AfterTokenize(_) => HookPoint::AfterTokenize,
            Hook::Wrap(_) => HookPoint::Wrap,
        }
    }
}

/// Registered callbacks, per extension point
#[derive(Default)]
pub struct Hooks {
    before_tokenize: Vec<Box<BeforeTokenizeFn>>,
    after_tokenize: Vec<Box<AfterTokenizeFn>>,
    wrap: Vec<Box<WrapFn>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback to its extension point
    pub fn add(&mut self, hook: Hook) {
        match hook {
            Hook::BeforeTokenize(callback) => self.before_tokenize.push(callback),
            Hook::AfterTokenize(callback) => self.after_tokenize.push(callback),
            Hook::Wrap(callback) => self.wrap.push(callback),
        }
    }

    /// Number of callbacks at a point
    pub fn count(&self, point: HookPoint) -> usize {
        match point {
            HookPoint::BeforeTokenize => self.before_tokenize.len(),
            HookPoint::AfterTokenize => self.after_tokenize.len(),
            HookPoint::Wrap => self.wrap.len(),
        }
    }

    pub fn run_before_tokenize(&self, ctx: &mut BeforeTokenize<'_>) {
        for (index, callback) in self.before_tokenize.iter().enumerate() {
            isolate(HookPoint::BeforeTokenize, index, || callback(ctx));
        }
    }

    pub fn run_after_tokenize(&self, ctx: &mut AfterTokenize<'_>) {
        for (index, callback) in self.after_tokenize.iter().enumerate() {
            isolate(HookPoint::AfterTokenize, index, || callback(ctx));
        }
    }

    pub fn run_wrap(&self, ctx: &mut Wrap<'_>) {
        for (index, callback) in self.wrap.iter().enumerate() {
            isolate(HookPoint::Wrap, index, || callback(ctx));
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_tokenize", &self.before_tokenize.len())
            .field("after_tokenize", &self.after_tokenize.len())
            .field("wrap", &self.wrap.len())
            .finish()
    }
}

/// Run one callback, logging instead of propagating failure
fn isolate(point: HookPoint, index: usize, callback: impl FnOnce() -> HookResult) {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(hook = point.name(), index, error = %err, "hook callback failed"),
        Err(_) => warn!(hook = point.name(), index, "hook callback panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tokens::text_of;

    #[test]
    fn test_callbacks_run_in_order() {
        let highlighter = Highlighter::empty();
        let mut hooks = Hooks::new();
        hooks.add(Hook::before_tokenize(|env| {
            env.code.push('a');
            Ok(())
        }));
        hooks.add(Hook::before_tokenize(|env| {
            env.code.push('b');
            Ok(())
        }));
        assert_eq!(hooks.count(HookPoint::BeforeTokenize), 2);
        assert_eq!(hooks.count(HookPoint::Wrap), 0);

        let mut env = BeforeTokenize {
            code: String::new(),
            language: "none".into(),
            highlighter: &highlighter,
        };
        hooks.run_before_tokenize(&mut env);
        assert_eq!(env.code, "ab");
    }

    #[test]
    fn test_failing_callbacks_are_isolated() {
        let highlighter = Highlighter::empty();
        let mut hooks = Hooks::new();
        hooks.add(Hook::after_tokenize(|_| Err(HookError("broken".into()))));
        hooks.add(Hook::after_tokenize(|_| panic!("hook blew up")));
        hooks.add(Hook::after_tokenize(|env| {
            env.tokens.push(Token::text("!"));
            Ok(())
        }));

        let mut tokens = vec![Token::text("hi")];
        let mut env = AfterTokenize {
            code: "hi",
            language: "none",
            tokens: &mut tokens,
            highlighter: &highlighter,
        };
        hooks.run_after_tokenize(&mut env);
        assert_eq!(text_of(&tokens), "hi!");
    }
}
