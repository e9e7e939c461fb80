//! Rule-priority tokenizer
//!
//! Walks an input string against a grammar table. The text starts out
//! as one raw segment; every rule of every entry, in grammar order, is
//! tried against the raw segments that are left, splitting each match
//! out into a typed token. Greedy rules search the whole text and may
//! swallow tokens earlier rules produced.

use std::ops::Range;

use tracing::debug;

use super::grammar::Grammar;
use super::registry::GrammarRegistry;
use super::rules::{Inside, PatternRule, RuleSet};
use super::tokens::{Token, TokenContent, TokenNode};
use crate::error::{HighlightError, Result};

/// Default work allowance per input byte
///
/// Visiting a segment costs one step and a search costs one step per byte
/// it covers, up to the match end or the end of the text searched.
pub const DEFAULT_STEP_BUDGET_PER_BYTE: usize = 256;
/// Default nesting limit for `inside` grammars
pub const DEFAULT_MAX_DEPTH: usize = 32;
/// Work every call gets regardless of input length
const BASE_STEP_BUDGET: usize = 16 * 1024;

/// Bounds on the work a single tokenize call may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub step_budget_per_byte: usize,
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            step_budget_per_byte: DEFAULT_STEP_BUDGET_PER_BYTE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    /// Total steps allowed for an input of `len` bytes
    pub fn budget_for(&self, len: usize) -> usize {
        BASE_STEP_BUDGET.saturating_add(self.step_budget_per_byte.saturating_mul(len))
    }
}

/// Grammar entries flattened for one tokenize pass
type Entries<'g> = Vec<(&'g str, &'g RuleSet)>;

/// A piece of the text being tokenized
enum Segment {
    /// Byte range of text no rule has claimed yet
    Raw(Range<usize>),
    Token(Token),
}

impl Segment {
    fn len(&self) -> usize {
        match self {
            Segment::Raw(range) => range.len(),
            Segment::Token(token) => token.len(),
        }
    }
}

/// Re-run of the higher-priority rules after a greedy match merged segments
struct Rematch {
    /// (entry, rule) that caused it; the re-run stops there
    cause: (usize, usize),
    /// Text position the re-run does not need to look past
    reach: usize,
}

/// One tokenize call's worth of state
pub struct Tokenizer<'r> {
    registry: &'r GrammarRegistry,
    budget: usize,
    steps_left: usize,
    max_depth: usize,
}

impl<'r> Tokenizer<'r> {
    /// Create a tokenizer sized for an input of `input_len` bytes
    pub fn new(registry: &'r GrammarRegistry, limits: Limits, input_len: usize) -> Self {
        let budget = limits.budget_for(input_len);
        Self {
            registry,
            budget,
            steps_left: budget,
            max_depth: limits.max_depth,
        }
    }

    /// Tokenize `text` with a grammar's entries (plus its `rest`)
    pub fn tokenize(&mut self, text: &str, grammar: &Grammar) -> Result<Vec<Token>> {
        let entries = grammar_entries(self.registry, grammar);
        self.tokenize_entries(text, &entries, 0)
    }

    fn tokenize_entries(&mut self, text: &str, entries: &[(&str, &RuleSet)], depth: usize) -> Result<Vec<Token>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut list = vec![Segment::Raw(0..text.len())];
        self.match_grammar(text, &mut list, entries, 0, 0, None, depth)?;

        Ok(list
            .into_iter()
            .map(|segment| match segment {
                Segment::Raw(range) => Token::Text(text[range].to_string()),
                Segment::Token(token) => token,
            })
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    fn match_grammar(
        &mut self,
        text: &str,
        list: &mut Vec<Segment>,
        entries: &[(&str, &RuleSet)],
        start_idx: usize,
        start_pos: usize,
        mut rematch: Option<&mut Rematch>,
        depth: usize,
    ) -> Result<()> {
        for (entry_idx, &(name, rules)) in entries.iter().enumerate() {
            for (rule_idx, rule) in rules.rules().iter().enumerate() {
                if rematch
                    .as_deref()
                    .is_some_and(|r| r.cause == (entry_idx, rule_idx))
                {
                    return Ok(());
                }

                let mut idx = start_idx;
                let mut pos = start_pos;

                while idx < list.len() {
                    if rematch.as_deref().is_some_and(|r| pos >= r.reach) {
                        break;
                    }
                    self.step()?;

                    let seg_len = list[idx].len();
                    let mut range = match &list[idx] {
                        Segment::Raw(range) => range.clone(),
                        Segment::Token(_) => {
                            pos += seg_len;
                            idx += 1;
                            continue;
                        }
                    };
                    let mut remove_count = 1;
                    let (from, to);

                    if rule.greedy {
                        let Some((m_start, m_end)) = self.find(name, rule, text, pos)? else {
                            break;
                        };
                        if m_start >= text.len() {
                            break;
                        }

                        // Locate the segment the match starts in
                        let mut p = pos + seg_len;
                        while m_start >= p {
                            idx += 1;
                            p += list[idx].len();
                        }
                        p -= list[idx].len();
                        pos = p;

                        // A match starting inside a token is not allowed
                        if matches!(list[idx], Segment::Token(_)) {
                            pos += list[idx].len();
                            idx += 1;
                            continue;
                        }

                        // Take every segment the match touches, then any raw
                        // text directly after it
                        remove_count = 0;
                        let mut k = idx;
                        while k < list.len() && (p < m_end || matches!(list[k], Segment::Raw(_))) {
                            remove_count += 1;
                            p += list[k].len();
                            k += 1;
                        }
                        range = pos..p;
                        from = m_start;
                        to = m_end;
                    } else {
                        let Some((m_start, m_end)) = self.find(name, rule, &text[range.clone()], 0)? else {
                            pos += seg_len;
                            idx += 1;
                            continue;
                        };
                        from = range.start + m_start;
                        to = range.start + m_end;
                    }

                    let reach = range.end;
                    if let Some(r) = rematch.as_deref_mut() {
                        r.reach = r.reach.max(reach);
                    }

                    let token = self.wrap(name, rule, &text[from..to], depth)?;

                    let mut replacement = Vec::with_capacity(3);
                    if from > range.start {
                        replacement.push(Segment::Raw(range.start..from));
                        pos += from - range.start;
                    }
                    let token_idx = idx + replacement.len();
                    replacement.push(Segment::Token(token));
                    if to < range.end {
                        replacement.push(Segment::Raw(to..range.end));
                    }
                    list.splice(idx..idx + remove_count, replacement);

                    if remove_count > 1 {
                        let mut nested = Rematch {
                            cause: (entry_idx, rule_idx),
                            reach,
                        };
                        self.match_grammar(text, list, entries, token_idx, pos, Some(&mut nested), depth)?;
                        if let Some(r) = rematch.as_deref_mut() {
                            r.reach = r.reach.max(nested.reach);
                        }
                    }

                    pos += to - from;
                    idx = token_idx + 1;
                }
            }
        }
        Ok(())
    }

    /// Build the token for a match, tokenizing its interior if asked to
    fn wrap(&mut self, name: &str, rule: &PatternRule, matched: &str, depth: usize) -> Result<Token> {
        let content = match &rule.inside {
            None => TokenContent::Text(matched.to_string()),
            Some(inside) => match inside_entries(self.registry, inside) {
                Some(_) if depth >= self.max_depth => {
                    debug!(token = name, depth, "nesting limit reached, keeping text");
                    TokenContent::Text(matched.to_string())
                }
                Some(entries) => TokenContent::Tokens(self.tokenize_entries(matched, &entries, depth + 1)?),
                None => {
                    debug!(token = name, "nested grammar not registered, keeping text");
                    TokenContent::Text(matched.to_string())
                }
            },
        };
        Ok(Token::Node(TokenNode::new(
            name,
            content,
            rule.alias.clone(),
            matched.len(),
        )))
    }

    /// Search `haystack` from `start`, paying for the bytes covered
    fn find(&mut self, name: &str, rule: &PatternRule, haystack: &str, start: usize) -> Result<Option<(usize, usize)>> {
        let found = rule.find_at(haystack, start).map_err(|source| HighlightError::Regex {
            token: name.to_string(),
            source: Box::new(source),
        })?;
        let scanned_to = found.map_or(haystack.len(), |(_, end)| end);
        self.charge(scanned_to.saturating_sub(start))?;
        Ok(found)
    }

    fn step(&mut self) -> Result<()> {
        self.charge(1)
    }

    fn charge(&mut self, cost: usize) -> Result<()> {
        if cost > self.steps_left {
            self.steps_left = 0;
            return Err(HighlightError::BudgetExceeded(self.budget));
        }
        self.steps_left -= cost;
        Ok(())
    }
}

/// A grammar's entries followed by those of its `rest` language
///
/// Entries named in both take the `rest` rules.
fn grammar_entries<'g>(registry: &'g GrammarRegistry, grammar: &'g Grammar) -> Entries<'g> {
    let rest = grammar.rest().and_then(|name| registry.get(name));
    let mut entries: Entries<'g> = grammar
        .iter()
        .map(|(name, rules)| (name, rest.and_then(|r| r.get(name)).unwrap_or(rules)))
        .collect();
    if let Some(rest) = rest {
        entries.extend(rest.iter().filter(|(name, _)| !grammar.contains(name)));
    }
    entries
}

fn inside_entries<'g>(registry: &'g GrammarRegistry, inside: &'g Inside) -> Option<Entries<'g>> {
    match inside {
        Inside::Grammar(grammar) => Some(grammar_entries(registry, grammar)),
        Inside::Language(language) => registry.get(language).map(|g| grammar_entries(registry, g)),
        Inside::Entries { language, tokens } => {
            let grammar = registry.get(language)?;
            Some(
                tokens
                    .iter()
                    .filter_map(|name| grammar.get(name).map(|rules| (name.as_str(), rules)))
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::tokens::{find_all, text_of};

    fn rule(pattern: &str) -> PatternRule {
        PatternRule::new(pattern).unwrap()
    }

    fn run(registry: &GrammarRegistry, text: &str, grammar: &Grammar) -> Vec<Token> {
        Tokenizer::new(registry, Limits::default(), text.len())
            .tokenize(text, grammar)
            .unwrap()
    }

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind().unwrap_or("")).collect()
    }

    #[test]
    fn test_splits_around_matches() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new().token("number", rule(r"\d+"));
        let tokens = run(&registry, "a 12 b 3", &grammar);

        assert_eq!(kinds(&tokens), ["", "number", "", "number"]);
        assert_eq!(tokens[1], Token::Node(TokenNode::new("number", TokenContent::Text("12".into()), vec![], 2)));
        assert_eq!(text_of(&tokens), "a 12 b 3");
    }

    #[test]
    fn test_earlier_entry_wins_same_start() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new()
            .token("keyword", rule(r"\bdef\b"))
            .token("identifier", rule(r"\b\w+\b"));
        let tokens = run(&registry, "def foo", &grammar);
        assert_eq!(kinds(&tokens), ["keyword", "", "identifier"]);

        let swapped = Grammar::new()
            .token("identifier", rule(r"\b\w+\b"))
            .token("keyword", rule(r"\bdef\b"));
        let tokens = run(&registry, "def foo", &swapped);
        assert_eq!(kinds(&tokens), ["identifier", "", "identifier"]);
    }

    #[test]
    fn test_lookbehind_context_stays_raw() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new().token("title", rule(r"(^|[^\\])#.+").lookbehind());
        let tokens = run(&registry, "x #head", &grammar);

        assert_eq!(tokens[0], Token::text("x "));
        assert_eq!(tokens[1].as_node().unwrap().text(), "#head");
    }

    #[test]
    fn test_inside_grammar_tokenizes_match() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new().token(
            "string",
            rule(r#""[^"]*""#).inside(Grammar::new().token("escape", rule(r"\\."))),
        );
        let tokens = run(&registry, r#"say "a\nb""#, &grammar);
        let string = tokens[1].as_node().unwrap();

        assert_eq!(kinds(string.children()), ["", "escape", ""]);
        assert_eq!(text_of(&tokens), r#"say "a\nb""#);
    }

    #[test]
    fn test_non_greedy_cannot_cross_tokens() {
        let registry = GrammarRegistry::new();
        // The comment splits the quote pair, so a plain string rule never
        // sees both quotes in one raw segment
        let grammar = Grammar::new()
            .token("comment", rule("#[a-z]+"))
            .token("string", rule(r#""[^"]*""#));
        let tokens = run(&registry, r#""a #b c""#, &grammar);
        assert!(find_all(&tokens, "string").is_empty());
    }

    #[test]
    fn test_greedy_remerges_earlier_tokens() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new()
            .token("comment", rule("#[a-z]+"))
            .token("string", rule(r#""[^"]*""#).greedy());
        let tokens = run(&registry, r#"x "a #b c" #d"#, &grammar);

        assert_eq!(kinds(&tokens), ["", "string", "", "comment"]);
        assert_eq!(tokens[1].as_node().unwrap().text(), r#""a #b c""#);
        assert_eq!(text_of(&tokens), r#"x "a #b c" #d"#);
    }

    #[test]
    fn test_greedy_rematch_retokenizes_split_tail() {
        let registry = GrammarRegistry::new();
        // The string ends inside the number `23`; the leftover `3` is raw
        // again and the number rule gets another look at it
        let grammar = Grammar::new()
            .token("number", rule(r"\d+"))
            .token("string", rule(r"'[^']*'\d").greedy());
        let tokens = run(&registry, "'1 '23", &grammar);

        assert_eq!(kinds(&tokens), ["string", "number"]);
        assert_eq!(tokens[0].as_node().unwrap().text(), "'1 '2");
        assert_eq!(tokens[1].as_node().unwrap().text(), "3");
    }

    #[test]
    fn test_greedy_skips_match_inside_token() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new()
            .token("comment", rule("#.*"))
            .token("string", rule(r#""[^"]*""#).greedy());
        let tokens = run(&registry, r#"# "x""#, &grammar);
        assert_eq!(kinds(&tokens), ["comment"]);
    }

    #[test]
    fn test_rest_appends_language_entries() {
        let mut registry = GrammarRegistry::new();
        registry.register_grammar("digits", Grammar::new().token("number", rule(r"\d+")), &[]);
        let grammar = Grammar::new().token("brace", rule(r"[{}]")).with_rest("digits");
        let tokens = run(&registry, "{1}", &grammar);
        assert_eq!(kinds(&tokens), ["brace", "number", "brace"]);
    }

    #[test]
    fn test_recursive_language_reference() {
        let mut registry = GrammarRegistry::new();
        registry.register_grammar(
            "parens",
            Grammar::new().token("group", rule(r"\((?:[^()]|\([^()]*\))*\)").inside(
                Grammar::new()
                    .token("punctuation", rule(r"^\(|\)$"))
                    .token("nested", rule(r"\([^()]*\)").inside_language("parens")),
            )),
            &[],
        );
        let tokens = registry.tokenize("(a (b) c)", "parens");
        assert_eq!(find_all(&tokens, "nested").len(), 1);
        assert_eq!(find_all(&tokens, "group").len(), 2);
        assert_eq!(text_of(&tokens), "(a (b) c)");
    }

    #[test]
    fn test_unknown_inside_language_keeps_text() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new().token("front-matter", rule("^---[^-]*---").inside_language("yaml"));
        let tokens = run(&registry, "---a: 1---", &grammar);
        let node = tokens[0].as_node().unwrap();
        assert_eq!(node.content, TokenContent::Text("---a: 1---".into()));
    }

    #[test]
    fn test_budget_exhaustion_errors() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new().token("a", rule("a"));
        let limits = Limits {
            step_budget_per_byte: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        let text = "ab".repeat(2 * BASE_STEP_BUDGET);
        let err = Tokenizer::new(&registry, limits, text.len())
            .tokenize(&text, &grammar)
            .unwrap_err();
        assert!(matches!(err, HighlightError::BudgetExceeded(_)));
    }

    #[test]
    fn test_budget_charges_scanned_bytes() {
        let registry = GrammarRegistry::new();
        // One greedy search that finds nothing still reads the whole text
        let grammar = Grammar::new().token("string", rule(r#""[^"]*""#).greedy());
        let text = "x".repeat(BASE_STEP_BUDGET + 1);

        let tight = Limits {
            step_budget_per_byte: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        let err = Tokenizer::new(&registry, tight, text.len())
            .tokenize(&text, &grammar)
            .unwrap_err();
        assert!(matches!(err, HighlightError::BudgetExceeded(_)));

        let roomy = Limits {
            step_budget_per_byte: 1,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        let tokens = Tokenizer::new(&registry, roomy, text.len())
            .tokenize(&text, &grammar)
            .unwrap();
        assert_eq!(tokens, vec![Token::text(text.clone())]);
    }

    #[test]
    fn test_depth_limit_keeps_text() {
        let mut registry = GrammarRegistry::new();
        registry.register_grammar(
            "loop",
            Grammar::new().token("all", rule(r"[\s\S]+").inside_language("loop")),
            &[],
        );
        let limits = Limits {
            step_budget_per_byte: DEFAULT_STEP_BUDGET_PER_BYTE,
            max_depth: 3,
        };
        let grammar = registry.get("loop").unwrap().clone();
        let tokens = Tokenizer::new(&registry, limits, 2).tokenize("xy", &grammar).unwrap();

        let mut depth = 0;
        let mut current = &tokens;
        while let Some(TokenNode {
            content: TokenContent::Tokens(children),
            ..
        }) = current.first().and_then(Token::as_node)
        {
            depth += 1;
            current = children;
        }
        assert_eq!(depth, 3);
        assert_eq!(text_of(&tokens), "xy");
    }

    #[test]
    fn test_empty_input() {
        let registry = GrammarRegistry::new();
        let grammar = Grammar::new().token("a", rule("a"));
        assert!(run(&registry, "", &grammar).is_empty());
    }
}
