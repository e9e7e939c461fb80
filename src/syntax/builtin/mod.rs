//! Built-in language definitions
//!
//! `markup` and `clike` are base tables; `markdown` and `ruby` are
//! derived from them at registration time.

mod clike;
mod markdown;
mod markup;
mod ruby;

use std::collections::BTreeMap;

use super::hooks::Hooks;
use super::registry::GrammarRegistry;
use crate::error::Result;

pub use clike::clike_grammar;
pub use markdown::markdown_grammar;
pub use markup::markup_grammar;
pub use ruby::ruby_grammar;

/// Register all built-in grammars
pub fn register_all(registry: &mut GrammarRegistry) -> Result<()> {
    let markup = markup_grammar()?;
    let clike = clike_grammar()?;
    let ruby = ruby_grammar(&clike)?;
    let markdown = markdown_grammar(&markup)?;

    registry.register_grammar("markup", markup, &["html", "xml", "svg", "mathml"]);
    registry.register_grammar("clike", clike, &[]);
    registry.register_grammar("ruby", ruby, &["rb"]);
    registry.register_grammar("markdown", markdown, &["md"]);
    Ok(())
}

/// Register the hooks the built-in grammars rely on
pub fn register_hooks(hooks: &mut Hooks) {
    markdown::register_hooks(hooks);
}

/// Code fence names that differ from the registered language names
pub fn default_language_remap() -> BTreeMap<String, String> {
    [("cs", "csharp"), ("dotnet", "csharp"), ("fs", "fsharp")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}
