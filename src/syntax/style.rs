//! Style types for terminal rendering
//!
//! A [`Theme`] maps token names to [`Style`]s. Lookup tries the token
//! kind first, then its aliases in order, so `heredoc-string` falls back
//! to the `string` style through its kind.

use std::collections::HashMap;

use crossterm::style::{Attribute, Color as TermColor, ContentStyle};

use super::tokens::TokenNode;

/// Terminal colors (ANSI 16-color palette for compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl Color {
    fn to_crossterm(self) -> Option<TermColor> {
        Some(match self {
            Color::Default => return None,
            Color::Black => TermColor::Black,
            Color::Red => TermColor::DarkRed,
            Color::Green => TermColor::DarkGreen,
            Color::Yellow => TermColor::DarkYellow,
            Color::Blue => TermColor::DarkBlue,
            Color::Magenta => TermColor::DarkMagenta,
            Color::Cyan => TermColor::DarkCyan,
            Color::White => TermColor::Grey,
            Color::BrightBlack => TermColor::DarkGrey,
            Color::BrightRed => TermColor::Red,
            Color::BrightGreen => TermColor::Green,
            Color::BrightYellow => TermColor::Yellow,
            Color::BrightBlue => TermColor::Blue,
            Color::BrightMagenta => TermColor::Magenta,
            Color::BrightCyan => TermColor::Cyan,
            Color::BrightWhite => TermColor::White,
        })
    }
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
    pub strikethrough: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Builder: set background color
    pub fn with_bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Builder: set bold
    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Builder: set strikethrough
    pub fn with_strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    /// Check if this is the default (no styling)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `inner` over this style
    ///
    /// Colors set in `inner` win; attributes accumulate.
    pub fn merge(self, inner: Style) -> Style {
        Style {
            fg: if inner.fg == Color::Default { self.fg } else { inner.fg },
            bg: if inner.bg == Color::Default { self.bg } else { inner.bg },
            bold: self.bold || inner.bold,
            italic: self.italic || inner.italic,
            underline: self.underline || inner.underline,
            strikethrough: self.strikethrough || inner.strikethrough,
        }
    }

    /// Convert to a crossterm content style
    pub fn to_content_style(self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = self.fg.to_crossterm();
        style.background_color = self.bg.to_crossterm();
        if self.bold {
            style.attributes.set(Attribute::Bold);
        }
        if self.italic {
            style.attributes.set(Attribute::Italic);
        }
        if self.underline {
            style.attributes.set(Attribute::Underlined);
        }
        if self.strikethrough {
            style.attributes.set(Attribute::CrossedOut);
        }
        style
    }
}

/// Token name to style mapping
#[derive(Debug, Clone, Default)]
pub struct Theme {
    styles: HashMap<String, Style>,
}

impl Theme {
    /// A theme with no styles
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder: style a token name
    pub fn with(mut self, name: &str, style: Style) -> Self {
        self.set(name, style);
        self
    }

    pub fn set(&mut self, name: &str, style: Style) {
        self.styles.insert(name.to_string(), style);
    }

    pub fn get(&self, name: &str) -> Option<Style> {
        self.styles.get(name).copied()
    }

    /// Style for a token: its kind first, then its aliases
    pub fn style_for(&self, node: &TokenNode) -> Option<Style> {
        std::iter::once(&node.kind)
            .chain(&node.aliases)
            .find_map(|name| self.get(name))
    }

    /// Terminal colors for the token names the built-in grammars produce
    pub fn terminal() -> Self {
        let comment = Style::fg(Color::BrightBlack).with_italic();
        let string = Style::fg(Color::Green);
        let number = Style::fg(Color::Cyan);
        let keyword = Style::fg(Color::Magenta).with_bold();
        let heading = Style::fg(Color::Blue).with_bold();

        Self::empty()
            .with("comment", comment)
            .with("prolog", comment)
            .with("doctype", comment)
            .with("cdata", comment)
            .with("string", string)
            .with("attr-value", string)
            .with("number", number)
            .with("boolean", number)
            .with("keyword", keyword)
            .with("class-name", Style::fg(Color::Yellow))
            .with("builtin", Style::fg(Color::Yellow))
            .with("constant", Style::fg(Color::BrightRed))
            .with("function", Style::fg(Color::Blue))
            .with("operator", Style::fg(Color::BrightWhite))
            .with("delimiter", Style::fg(Color::BrightMagenta))
            .with("tag", Style::fg(Color::Red))
            .with("attr-name", Style::fg(Color::Yellow))
            .with("entity", Style::fg(Color::BrightCyan))
            .with("title", heading)
            .with("important", heading)
            .with("bold", Style::default().with_bold())
            .with("italic", Style::default().with_italic())
            .with("strike", Style::default().with_strikethrough())
            .with("url", Style::fg(Color::BrightBlue).with_underline())
            .with("variable", Style::fg(Color::BrightRed))
            .with("code-snippet", Style::fg(Color::Yellow))
            .with("blockquote", Style::fg(Color::BrightBlack))
    }
}
