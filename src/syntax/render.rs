//! Token tree renderers
//!
//! HTML with one `span` per typed token, colored terminal output, and a
//! positional dump for debugging grammars.

use std::fmt::Write as _;
use std::io::Write;

use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent};
use unicode_width::UnicodeWidthChar;

use super::highlighter::Highlighter;
use super::hooks::Wrap;
use super::style::{Style, Theme};
use super::tokens::{Token, TokenContent, TokenNode};
use crate::error::Result;

/// Serialize a token tree to HTML
///
/// Every typed token goes through the `wrap` hooks before it is
/// written, so hooks can change its tag, classes and attributes.
pub fn to_html(tokens: &[Token], language: &str, highlighter: &Highlighter) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Text(text) => out.push_str(&encode(text)),
            Token::Node(node) => out.push_str(&node_html(node, language, highlighter)),
        }
    }
    out
}

fn node_html(node: &TokenNode, language: &str, highlighter: &Highlighter) -> String {
    let content = match &node.content {
        TokenContent::Text(text) => encode(text),
        TokenContent::Tokens(children) => to_html(children, language, highlighter),
    };
    let mut classes = vec!["token".to_string(), node.kind.clone()];
    classes.extend(node.aliases.iter().cloned());

    let mut env = Wrap {
        kind: &node.kind,
        content,
        tag: "span".to_string(),
        classes,
        attributes: node.attributes.clone(),
        language,
        highlighter,
    };
    highlighter.hooks().run_wrap(&mut env);

    let mut attributes = String::new();
    for (name, value) in &env.attributes {
        let _ = write!(attributes, " {}=\"{}\"", name, value.replace('"', "&quot;"));
    }
    format!(
        "<{tag} class=\"{classes}\"{attributes}>{content}</{tag}>",
        tag = env.tag,
        classes = env.classes.join(" "),
        content = env.content,
    )
}

/// Escape text for HTML element content
fn encode(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('\u{a0}', " ")
}

/// Writes token trees with terminal colors
#[derive(Debug, Clone)]
pub struct AnsiRenderer {
    theme: Theme,
}

impl AnsiRenderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Write `tokens` to `out`, flushing at the end
    pub fn render<W: Write>(&self, out: &mut W, tokens: &[Token]) -> Result<()> {
        self.write_tokens(out, tokens, Style::default())?;
        out.flush()?;
        Ok(())
    }

    /// Nested tokens are drawn over the style of their parent
    fn write_tokens<W: Write>(&self, out: &mut W, tokens: &[Token], inherited: Style) -> Result<()> {
        for token in tokens {
            match token {
                Token::Text(text) => write_styled(out, text, inherited)?,
                Token::Node(node) => {
                    let style = self
                        .theme
                        .style_for(node)
                        .map_or(inherited, |own| inherited.merge(own));
                    match &node.content {
                        TokenContent::Text(text) => write_styled(out, text, style)?,
                        TokenContent::Tokens(children) => self.write_tokens(out, children, style)?,
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for AnsiRenderer {
    fn default() -> Self {
        Self::new(Theme::terminal())
    }
}

fn write_styled<W: Write>(out: &mut W, text: &str, style: Style) -> Result<()> {
    if style.is_default() {
        queue!(out, Print(text))?;
    } else {
        queue!(out, PrintStyledContent(style.to_content_style().apply(text)))?;
    }
    Ok(())
}

/// Line and display column of a position in the input, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += ch.width().unwrap_or(1);
            }
        }
    }
}

/// Indented listing of a token tree, one token per line
///
/// Each line shows the token name, its aliases in brackets and where it
/// starts; leaves show their text too.
pub fn dump_tree(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut position = Position { line: 1, column: 1 };
    dump_level(&mut out, tokens, 0, &mut position);
    out
}

fn dump_level(out: &mut String, tokens: &[Token], depth: usize, position: &mut Position) {
    let indent = "  ".repeat(depth);
    for token in tokens {
        let at = *position;
        match token {
            Token::Text(text) => {
                let _ = writeln!(out, "{indent}text {}:{} {:?}", at.line, at.column, text);
                position.advance(text);
            }
            Token::Node(node) => {
                let mut label = node.kind.clone();
                if !node.aliases.is_empty() {
                    let _ = write!(label, "[{}]", node.aliases.join(","));
                }
                match &node.content {
                    TokenContent::Text(text) => {
                        let _ = writeln!(out, "{indent}{label} {}:{} {:?}", at.line, at.column, text);
                        position.advance(text);
                    }
                    TokenContent::Tokens(children) => {
                        let _ = writeln!(out, "{indent}{label} {}:{}", at.line, at.column);
                        dump_level(out, children, depth + 1, position);
                    }
                }
            }
        }
    }
}
