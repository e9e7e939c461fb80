//! C-like base language definition
//!
//! Not useful on its own; Ruby is derived from it.

use crate::error::Result;
use crate::syntax::grammar::Grammar;
use crate::syntax::rules::PatternRule;

/// Create the clike grammar
pub fn clike_grammar() -> Result<Grammar> {
    Ok(Grammar::new()
        .token(
            "comment",
            vec![
                PatternRule::new(r"(^|[^\\])/\*[\s\S]*?(?:\*/|$)")?
                    .lookbehind()
                    .greedy(),
                PatternRule::new(r"(^|[^\\:])//.*")?.lookbehind().greedy(),
            ],
        )
        .token(
            "string",
            PatternRule::new(r#"(["'])(?:\\(?:\r\n|[\s\S])|(?!\1)[^\\\r\n])*\1"#)?.greedy(),
        )
        .token(
            "class-name",
            PatternRule::new(
                r"(?i)(\b(?:class|extends|implements|instanceof|interface|new|trait)\s+|\bcatch\s+\()[\w.\\]+",
            )?
            .lookbehind()
            .inside(Grammar::new().token("punctuation", PatternRule::new(r"[.\\]")?)),
        )
        .token(
            "keyword",
            PatternRule::new(
                r"\b(?:break|catch|continue|do|else|finally|for|function|if|in|instanceof|new|null|return|throw|try|while)\b",
            )?,
        )
        .token("boolean", PatternRule::new(r"\b(?:false|true)\b")?)
        .token("function", PatternRule::new(r"\b\w+(?=\()")?)
        .token(
            "number",
            PatternRule::new(r"(?i)\b0x[\da-f]+\b|(?:\b\d+(?:\.\d*)?|\B\.\d+)(?:e[+-]?\d+)?")?,
        )
        .token(
            "operator",
            PatternRule::new(r"[<>]=?|[!=]=?=?|--?|\+\+?|&&?|\|\|?|[?*/~^%]")?,
        )
        .token("punctuation", PatternRule::new(r"[{}\[\];(),.:]")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::registry::GrammarRegistry;
    use crate::syntax::tokens::{find_all, text_of};

    #[test]
    fn test_clike_basics() {
        let mut registry = GrammarRegistry::new();
        registry.register_grammar("clike", clike_grammar().unwrap(), &[]);
        let source = "if (x == 0x1F) { return foo(\"a\"); } // done";
        let tokens = registry.tokenize(source, "clike");

        assert_eq!(tokens[0].kind(), Some("keyword"));
        assert_eq!(find_all(&tokens, "number")[0].text(), "0x1F");
        assert_eq!(find_all(&tokens, "function")[0].text(), "foo");
        assert_eq!(find_all(&tokens, "string")[0].text(), "\"a\"");
        assert_eq!(find_all(&tokens, "comment")[0].text(), "// done");
        assert_eq!(text_of(&tokens), source);
    }
}
