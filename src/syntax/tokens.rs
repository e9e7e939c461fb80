//! Token trees
//!
//! The tokenizer produces a flat list of [`Token`]s whose structured
//! nodes may nest further tokens. Leaf text, read in order, always
//! spells out the original input.

use std::collections::BTreeMap;

/// A span of the input: raw text, or a typed node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text no rule matched
    Text(String),
    Node(TokenNode),
}

/// Content of a typed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenContent {
    Text(String),
    /// Result of tokenizing the match with a nested grammar
    Tokens(Vec<Token>),
}

/// A typed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenNode {
    /// Token name from the grammar (e.g. `keyword`)
    pub kind: String,
    pub content: TokenContent,
    /// Secondary type names, without duplicates
    pub aliases: Vec<String>,
    /// Extra attributes, set by hooks
    pub attributes: BTreeMap<String, String>,
    /// Byte length of the matched text
    pub length: usize,
}

impl TokenNode {
    /// Create a new node
    pub fn new(kind: &str, content: TokenContent, aliases: Vec<String>, length: usize) -> Self {
        Self {
            kind: kind.to_string(),
            content,
            aliases,
            attributes: BTreeMap::new(),
            length,
        }
    }

    /// Check if the node carries `alias`
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a == alias)
    }

    /// Add an alias unless it is already present
    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if !self.has_alias(&alias) {
            self.aliases.push(alias);
        }
    }

    /// True if `name` is the kind or one of the aliases
    pub fn is(&self, name: &str) -> bool {
        self.kind == name || self.has_alias(name)
    }

    /// Nested tokens (empty for plain-text content)
    pub fn children(&self) -> &[Token] {
        match &self.content {
            TokenContent::Text(_) => &[],
            TokenContent::Tokens(tokens) => tokens,
        }
    }

    /// The matched text
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.length);
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match &self.content {
            TokenContent::Text(text) => out.push_str(text),
            TokenContent::Tokens(tokens) => {
                for token in tokens {
                    token.push_text(out);
                }
            }
        }
    }
}

impl Token {
    /// Plain text token
    pub fn text(text: impl Into<String>) -> Self {
        Token::Text(text.into())
    }

    pub fn as_node(&self) -> Option<&TokenNode> {
        match self {
            Token::Node(node) => Some(node),
            Token::Text(_) => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut TokenNode> {
        match self {
            Token::Node(node) => Some(node),
            Token::Text(_) => None,
        }
    }

    /// Token name, if typed
    pub fn kind(&self) -> Option<&str> {
        self.as_node().map(|node| node.kind.as_str())
    }

    /// Byte length of the covered input
    pub fn len(&self) -> usize {
        match self {
            Token::Text(text) => text.len(),
            Token::Node(node) => node.length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Token::Text(text) => out.push_str(text),
            Token::Node(node) => node.push_text(out),
        }
    }
}

/// Concatenate the leaf text of a token list
pub fn text_of(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.push_text(&mut out);
    }
    out
}

/// All nodes named `name` (by kind or alias), depth first
pub fn find_all<'t>(tokens: &'t [Token], name: &str) -> Vec<&'t TokenNode> {
    let mut found = Vec::new();
    collect(tokens, name, &mut found);
    found
}

fn collect<'t>(tokens: &'t [Token], name: &str, found: &mut Vec<&'t TokenNode>) {
    for node in tokens.iter().filter_map(Token::as_node) {
        if node.is(name) {
            found.push(node);
        }
        collect(node.children(), name, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Token> {
        vec![
            Token::text("say "),
            Token::Node(TokenNode::new(
                "string",
                TokenContent::Tokens(vec![
                    Token::text("\"a "),
                    Token::Node(TokenNode::new(
                        "interpolation",
                        TokenContent::Text("#{b}".into()),
                        vec![],
                        4,
                    )),
                    Token::text("\""),
                ]),
                vec!["literal".into()],
                9,
            )),
        ]
    }

    #[test]
    fn test_text_of_reassembles_input() {
        assert_eq!(text_of(&sample()), "say \"a #{b}\"");
    }

    #[test]
    fn test_find_all_by_kind_and_alias() {
        let tokens = sample();
        assert_eq!(find_all(&tokens, "interpolation").len(), 1);
        assert_eq!(find_all(&tokens, "literal")[0].kind, "string");
        assert!(find_all(&tokens, "keyword").is_empty());
    }

    #[test]
    fn test_add_alias_deduplicates() {
        let mut node = TokenNode::new("code-block", TokenContent::Text("x".into()), vec![], 1);
        node.add_alias("language-ruby");
        node.add_alias("language-ruby");
        assert_eq!(node.aliases, ["language-ruby"]);
        assert!(node.is("language-ruby"));
    }

    #[test]
    fn test_lengths() {
        let tokens = sample();
        assert_eq!(tokens[0].len(), 4);
        assert_eq!(tokens[1].len(), 9);
        assert_eq!(tokens[1].kind(), Some("string"));
        assert_eq!(tokens[1].as_node().unwrap().text(), "\"a #{b}\"");
    }
}
