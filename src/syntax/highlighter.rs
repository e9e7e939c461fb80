//! Highlighter facade
//!
//! Ties the grammar registry, the hook pipeline and configuration
//! together: tokenize by language name with hooks applied, or go
//! straight to HTML.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::builtin;
use super::hooks::{AfterTokenize, BeforeTokenize, Hook, Hooks};
use super::registry::GrammarRegistry;
use super::render;
use super::tokens::Token;
use crate::config::Config;
use crate::error::Result;

/// Loads grammars the registry does not have yet
///
/// Called fire-and-forget when rendered output names an unknown
/// language; the implementor patches the element with id `element_id`
/// once the grammar is available. Failing to load is not an error.
pub trait LazyLoader: Send + Sync {
    fn load_language(&self, language: &str, element_id: &str);
}

/// Syntax highlighter: registry plus hooks
pub struct Highlighter {
    registry: GrammarRegistry,
    hooks: Hooks,
    lazy_loader: Option<Arc<dyn LazyLoader>>,
    /// Code fence language names rewritten before lookup
    language_remap: BTreeMap<String, String>,
    next_element_id: AtomicU64,
}

impl Highlighter {
    /// Highlighter with no grammars and no hooks
    pub fn empty() -> Self {
        Self {
            registry: GrammarRegistry::new(),
            hooks: Hooks::new(),
            lazy_loader: None,
            language_remap: BTreeMap::new(),
            next_element_id: AtomicU64::new(0),
        }
    }

    /// Highlighter with the built-in grammars and their hooks
    pub fn new() -> Result<Self> {
        let mut highlighter = Self::empty();
        builtin::register_all(&mut highlighter.registry)?;
        builtin::register_hooks(&mut highlighter.hooks);
        highlighter.language_remap = builtin::default_language_remap();
        Ok(highlighter)
    }

    /// Built-in highlighter adjusted by a configuration
    ///
    /// Grammars declared in the config are registered in order, so a
    /// later one may extend an earlier one.
    pub fn with_config(config: &Config) -> Result<Self> {
        let mut highlighter = Self::new()?;
        highlighter.registry.set_limits(config.limits());
        for (from, to) in &config.language_remap {
            highlighter.language_remap.insert(from.to_lowercase(), to.to_lowercase());
        }
        for def in &config.grammars {
            def.register(&mut highlighter.registry)?;
        }
        Ok(highlighter)
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Register a hook callback
    pub fn add_hook(&mut self, hook: Hook) {
        debug!(hook = hook.point().name(), "hook added");
        self.hooks.add(hook);
    }

    pub fn lazy_loader(&self) -> Option<&dyn LazyLoader> {
        self.lazy_loader.as_deref()
    }

    pub fn set_lazy_loader(&mut self, loader: Arc<dyn LazyLoader>) {
        self.lazy_loader = Some(loader);
    }

    /// Normalize a language name declared on a code fence
    pub fn remap_language(&self, declared: &str) -> String {
        let lang = declared.trim().to_lowercase();
        self.language_remap.get(&lang).cloned().unwrap_or(lang)
    }

    /// A fresh element id for deferred highlighting
    pub fn next_element_id(&self) -> String {
        format!("md-{}", self.next_element_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Tokenize text by language name, running the tokenize hooks
    pub fn tokenize(&self, text: &str, language: &str) -> Vec<Token> {
        let mut env = BeforeTokenize {
            code: text.to_string(),
            language: language.to_string(),
            highlighter: self,
        };
        self.hooks.run_before_tokenize(&mut env);
        let BeforeTokenize { code, language, .. } = env;

        let mut tokens = self.registry.tokenize(&code, &language);
        let mut env = AfterTokenize {
            code: &code,
            language: &language,
            tokens: &mut tokens,
            highlighter: self,
        };
        self.hooks.run_after_tokenize(&mut env);
        tokens
    }

    /// Tokenize and serialize to HTML
    pub fn highlight(&self, text: &str, language: &str) -> String {
        let tokens = self.tokenize(text, language);
        render::to_html(&tokens, language, self)
    }
}

impl fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Highlighter")
            .field("languages", &self.registry.list_languages())
            .field("hooks", &self.hooks)
            .field("lazy_loader", &self.lazy_loader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::hooks::HookPoint;
    use crate::syntax::tokens::text_of;

    #[test]
    fn test_builtin_hooks_installed() {
        let highlighter = Highlighter::new().unwrap();
        assert_eq!(highlighter.hooks().count(HookPoint::AfterTokenize), 1);
        assert_eq!(highlighter.hooks().count(HookPoint::Wrap), 1);
    }

    #[test]
    fn test_before_tokenize_can_switch_language() {
        let mut highlighter = Highlighter::new().unwrap();
        highlighter.add_hook(Hook::before_tokenize(|env| {
            if env.language == "irb" {
                env.language = "ruby".into();
            }
            Ok(())
        }));
        let tokens = highlighter.tokenize("nil", "irb");
        assert_eq!(tokens[0].kind(), Some("keyword"));
    }

    #[test]
    fn test_remap_language() {
        let highlighter = Highlighter::new().unwrap();
        assert_eq!(highlighter.remap_language("CS"), "csharp");
        assert_eq!(highlighter.remap_language("dotnet"), "csharp");
        assert_eq!(highlighter.remap_language("fs"), "fsharp");
        assert_eq!(highlighter.remap_language(" Ruby "), "ruby");
    }

    #[test]
    fn test_element_ids_unique() {
        let highlighter = Highlighter::empty();
        assert_eq!(highlighter.next_element_id(), "md-0");
        assert_eq!(highlighter.next_element_id(), "md-1");
    }

    #[test]
    fn test_with_config_registers_grammars() {
        let config = Config::parse(
            r#"
            [language-remap]
            ruby3 = "ruby"

            [[grammar]]
            name = "ini"
            aliases = ["cfg"]

            [[grammar.token]]
            name = "section"
            pattern = '(?m)^\[[^\]]+\]'
            "#,
        )
        .unwrap();
        let highlighter = Highlighter::with_config(&config).unwrap();

        assert_eq!(highlighter.remap_language("ruby3"), "ruby");
        let tokens = highlighter.tokenize("[main]\nx=1", "cfg");
        assert_eq!(tokens[0].kind(), Some("section"));
        assert_eq!(text_of(&tokens), "[main]\nx=1");
    }

    #[test]
    fn test_highlighter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Highlighter>();
    }
}
