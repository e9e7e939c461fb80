//! Markdown language definition
//!
//! Built on `markup`, so inline HTML keeps its highlighting. Fenced code
//! blocks are re-highlighted with the language named on the fence by an
//! `after-tokenize` hook.

use tracing::debug;

use crate::error::Result;
use crate::syntax::grammar::{self, Grammar};
use crate::syntax::highlighter::Highlighter;
use crate::syntax::hooks::{Hook, Hooks};
use crate::syntax::rules::PatternRule;
use crate::syntax::tokens::{Token, TokenContent, TokenNode};

/// Line start that also holds after a lone `\r`
const BOL: &str = r"(?:^|(?<=\r))";
/// Line end that also holds before a `\r`
const EOL: &str = r"(?=\r|$)";

/// Inline tokens that may nest inside each other's text
const INLINE: [&str; 5] = ["url", "bold", "italic", "strike", "code-snippet"];

/// The inline tokens allowed inside `token`, everything but itself
fn nested_inline(token: &str) -> Vec<&'static str> {
    INLINE.iter().copied().filter(|name| *name != token).collect()
}

/// `**strong**`, `*em*`, `~~strike~~`: delimiters around nested content
fn emphasis(token: &str, pattern: &str, content: &str, punctuation: &str) -> Result<PatternRule> {
    Ok(PatternRule::new(pattern)?.lookbehind().greedy().inside(
        Grammar::new()
            .token(
                "content",
                PatternRule::new(content)?
                    .lookbehind()
                    .inside_entries("markdown", &nested_inline(token)),
            )
            .token("punctuation", PatternRule::new(punctuation)?),
    ))
}

fn table() -> Result<PatternRule> {
    Ok(PatternRule::new(r"\|.+?\|(?:\n|\r\n?)[|:][-\t:| ]+(?=\n)")?.inside(
        Grammar::new()
            .token(
                "table-header-row",
                PatternRule::new(r"^.*\|(?:\n|\r\n?)\|(?:[-:]\|)+(?=\n)")?.inside(
                    Grammar::new()
                        .token(
                            "table-header",
                            PatternRule::new(r"\|[^|\r\n]+")?.alias("important"),
                        )
                        .token("punctuation", PatternRule::new(r"\||[-:]")?),
                ),
            )
            .token(
                "table-data-rows",
                PatternRule::new(r"(?:\n|\r\n?)(?:\|[^|\r\n]+)+(?:\n|\r\n?)")?.inside(
                    Grammar::new()
                        .token("table-data", PatternRule::new(r"\|[^|\r\n]+")?)
                        .token("punctuation", PatternRule::new(r"\|")?),
                ),
            )
            .token("punctuation", PatternRule::new(r"\|")?),
    ))
}

fn code() -> Result<Vec<PatternRule>> {
    Ok(vec![
        // Indented by 4 spaces or a tab, after an empty line
        PatternRule::new(r"(?:\n|\r\n?)(?:(?:\t|[ ]{4}).*(?:\n|\r\n?))+")?.alias("keyword"),
        PatternRule::new(&format!(r"(?m){BOL}```[\s\S]*?{BOL}```{EOL}"))?
            .greedy()
            .inside(
                Grammar::new()
                    .token(
                        "code-block",
                        PatternRule::new(&format!(
                            r"(?m)^(```[^\r\n]*(?:\n|\r\n?))[\s\S]+?(?=(?:\n|\r\n?)```{EOL})"
                        ))?
                        .lookbehind(),
                    )
                    .token("code-language", PatternRule::new(r"^(```)[^\r\n]+")?.lookbehind())
                    .token("punctuation", PatternRule::new(r"```")?),
            ),
    ])
}

fn url_reference() -> Result<PatternRule> {
    Ok(PatternRule::new(
        r#"!?\[[^\]]+\]:[\t ]+(?:\S+|<(?:\\.|[^>\\])+>)(?:[\t ]+(?:"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|\((?:\\.|[^)\\])*\)))?"#,
    )?
    .alias("url")
    .inside(
        Grammar::new()
            .token("variable", PatternRule::new(r"^(!?\[)[^\]]+")?.lookbehind())
            .token(
                "string",
                PatternRule::new(r#"(?:"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|\((?:\\.|[^)\\])*\))$"#)?,
            )
            .token("punctuation", PatternRule::new(r"^[\[\]!:]|[<>]")?),
    ))
}

fn url() -> Result<PatternRule> {
    Ok(PatternRule::new(
        r#"(^|[^\\])\[[^\[\]]+\](?:\([^\s)]+(?:[\t ]+"(?:\\.|[^"\\])*")?\)|[ \t]?\[[^\[\]]+\])"#,
    )?
    .lookbehind()
    .greedy()
    .inside(
        Grammar::new()
            .token("operator", PatternRule::new(r"^!")?)
            .token(
                "content",
                PatternRule::new(r"(^\[)[^\]]+(?=\])")?
                    .lookbehind()
                    .inside_entries("markdown", &nested_inline("url")),
            )
            .token(
                "variable",
                PatternRule::new(r"(^\][ \t]?\[)[^\]]+(?=\]$)")?.lookbehind(),
            )
            .token("url", PatternRule::new(r"(^\]\()[^\s)]+")?.lookbehind())
            .token(
                "string",
                PatternRule::new(r#"(^[ \t]+)"(?:\\.|[^"\\])*"(?=\)$)"#)?.lookbehind(),
            ),
    ))
}

/// Create the Markdown grammar on top of `markup`
pub fn markdown_grammar(markup: &Grammar) -> Result<Grammar> {
    let markdown = grammar::extend(markup, Grammar::new());
    let entries = Grammar::new()
        .token(
            "front-matter-block",
            PatternRule::new(&format!(r"(?m){BOL}---[\s\S]*?{BOL}---{EOL}"))?
                .greedy()
                .inside(
                    Grammar::new()
                        .token("punctuation", PatternRule::new(r"^---|^---$")?)
                        .token(
                            "front-matter",
                            PatternRule::new(r"\S+(?:\s+\S+)*")?
                                .alias("yaml")
                                .alias("language-yaml")
                                .inside_language("yaml"),
                        ),
                ),
        )
        .token(
            "blockquote",
            PatternRule::new(&format!(r"(?m){BOL}>(?:[\t ]*>)*"))?.alias("punctuation"),
        )
        .token("table", table()?)
        .token("code", code()?)
        .token(
            "title",
            vec![
                // Setext: text underlined with === or ---
                PatternRule::new(r"(?m)\S[^\r\n]*(?:\n|\r\n?)(?:==+|--+)(?=[ \t]*(?:\r|$))")?
                    .alias("important")
                    .inside(Grammar::new().token("punctuation", PatternRule::new(r"==+$|--+$")?)),
                PatternRule::new(r"(^|[^\\])#[^\r\n]+")?
                    .lookbehind()
                    .alias("important")
                    .inside(Grammar::new().token("punctuation", PatternRule::new(r"^#+|#+$")?)),
            ],
        )
        .token(
            "hr",
            PatternRule::new(r"(?m)(^|[^\\])([*-])(?:\s*\2){2,}(?=\s*$)")?
                .lookbehind()
                .alias("punctuation"),
        )
        .token(
            "list",
            PatternRule::new(r"(?m)(^|[^\\])(?:[*+-]|\d+\.)(?=[\t ].)")?
                .lookbehind()
                .alias("punctuation"),
        )
        .token("url-reference", url_reference()?)
        .token(
            "bold",
            emphasis(
                "bold",
                r"(^|[^\\])(\*\*|__)(?:(?:\r?\n|[^\\])|(?:\\.))*?\2",
                r"(^..)[\s\S]+(?=..$)",
                r"\*\*|__",
            )?,
        )
        .token(
            "italic",
            emphasis(
                "italic",
                r"(^|[^\\])([*_])(?:(?:\r?\n|[^\\])|(?:\\.))*?\2",
                r"(^.)[\s\S]+(?=.$)",
                r"[*_]",
            )?,
        )
        .token(
            "strike",
            emphasis(
                "strike",
                r"(^|[^\\])(~~?)(?:(?:\r?\n|[^\\])|(?:\\.))*?\2",
                r"(^~~?)[\s\S]+(?=\1$)",
                r"~~?",
            )?,
        )
        .token(
            "code-snippet",
            PatternRule::new(r"(^|[^\\`])(?:``[^`\r\n]+(?:`[^`\r\n]+)*``(?!`)|`[^`\r\n]+`(?!`))")?
                .lookbehind()
                .greedy()
                .alias("code")
                .alias("keyword"),
        )
        .token("url", url()?);

    Ok(grammar::insert_before(&markdown, "prolog", entries))
}

/// Install the fenced code block hooks
pub fn register_hooks(hooks: &mut Hooks) {
    hooks.add(Hook::after_tokenize(|env| {
        let registry = env.highlighter.registry();
        if registry.canonical_name(env.language) != Some("markdown") {
            return Ok(());
        }
        highlight_code_blocks(env.tokens, env.highlighter);
        Ok(())
    }));

    hooks.add(Hook::wrap(|env| {
        if env.kind != "code-block" {
            return Ok(());
        }
        let Some(language) = env
            .classes
            .iter()
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string)
        else {
            return Ok(());
        };

        let highlighter = env.highlighter;
        if language.is_empty() || language == "none" || highlighter.registry().contains(&language) {
            return Ok(());
        }
        if let Some(loader) = highlighter.lazy_loader() {
            let id = highlighter.next_element_id();
            debug!(language = %language, id = %id, "deferring code block highlighting");
            loader.load_language(&language, &id);
            env.attributes.insert("id".to_string(), id);
        }
        Ok(())
    }));
}

/// Walk a tree, highlighting every fenced block in its declared language
fn highlight_code_blocks(tokens: &mut [Token], highlighter: &Highlighter) {
    for token in tokens.iter_mut() {
        let Some(node) = token.as_node_mut() else {
            continue;
        };
        if node.kind == "code" {
            highlight_code_block(node, highlighter);
        } else if let TokenContent::Tokens(children) = &mut node.content {
            highlight_code_blocks(children, highlighter);
        }
    }
}

/// Fenced block content is `[```, code-language, newline, code-block, newline, ```]`
fn highlight_code_block(code: &mut TokenNode, highlighter: &Highlighter) {
    let TokenContent::Tokens(children) = &mut code.content else {
        return;
    };
    let declared = match children.get(1).and_then(Token::as_node) {
        Some(TokenNode {
            kind,
            content: TokenContent::Text(text),
            ..
        }) if kind == "code-language" => text.clone(),
        _ => return,
    };
    let Some(block) = children
        .get_mut(3)
        .and_then(Token::as_node_mut)
        .filter(|node| node.kind == "code-block")
    else {
        return;
    };

    let language = highlighter.remap_language(&declared);
    match highlighter.registry().canonical_name(&language) {
        Some(resolved) => {
            let text = block.text();
            block.content = TokenContent::Tokens(highlighter.tokenize(&text, resolved));
            block.add_alias(format!("language-{resolved}"));
        }
        None => {
            debug!(language = %language, "no grammar for code block, leaving it plain");
            block.add_alias(format!("language-{language}"));
        }
    }
    code.attributes.insert(format!("language-{language}"), String::new());
}
