//! Ruby language definition

use crate::error::Result;
use crate::syntax::grammar::{self, Grammar};
use crate::syntax::rules::PatternRule;

/// `#{...}` inside strings, tokenized with the full Ruby grammar
fn interpolation() -> Result<Grammar> {
    Ok(Grammar::new().token(
        "interpolation",
        PatternRule::new(r"#\{[^}]+\}")?.inside(
            Grammar::new()
                .token(
                    "delimiter",
                    PatternRule::new(r"^#\{|\}$")?.alias("punctuation"),
                )
                .with_rest("ruby"),
        ),
    ))
}

/// Heredoc opener/closer names
fn heredoc_delimiter(pattern: &str, punctuation: &str) -> Result<Grammar> {
    Ok(Grammar::new().token(
        "delimiter",
        PatternRule::new(pattern)?
            .alias("symbol")
            .inside(Grammar::new().token("punctuation", PatternRule::new(punctuation)?)),
    ))
}

fn strings() -> Result<Vec<PatternRule>> {
    let percent_literals = [
        r"%[qQiIwWxs]?([^a-zA-Z0-9\s{(\[<])(?:(?!\1)[^\\]|\\[\s\S])*\1",
        r"%[qQiIwWxs]?\([^)]*\)",
        r"%[qQiIwWxs]?\{[^}]*\}",
        r"%[qQiIwWxs]?\[[^\]]*\]",
        r"%[qQiIwWxs]?<[^>]*>",
        r#"("|')(?:#\{[^}]+\}|#(?!\{)|\\(?:\r\n|[\s\S])|(?!\1)[^\\#\r\n])*\1"#,
    ];
    let mut rules = percent_literals
        .iter()
        .map(|pattern| -> Result<PatternRule> {
            Ok(PatternRule::new(pattern)?.greedy().inside(interpolation()?))
        })
        .collect::<Result<Vec<_>>>()?;

    rules.push(
        PatternRule::new(r"(?i)<<[-~]?([a-z_]\w*)[\r\n](?:.*[\r\n])*?[\t ]*\1")?
            .alias("heredoc-string")
            .greedy()
            .inside(grammar::extend(
                &heredoc_delimiter(r"(?i)^<<[-~]?[a-z_]\w*|[a-z_]\w*$", r"^<<[-~]?")?,
                interpolation()?,
            )),
    );
    // Single-quoted heredocs do not interpolate
    rules.push(
        PatternRule::new(r"(?i)<<[-~]?'([a-z_]\w*)'[\r\n](?:.*[\r\n])*?[\t ]*\1")?
            .alias("heredoc-string")
            .greedy()
            .inside(heredoc_delimiter(
                r"(?i)^<<[-~]?'[a-z_]\w*'|[a-z_]\w*$",
                r"^<<[-~]?'|'$",
            )?),
    );
    rules.push(
        PatternRule::new(r#"(?i)<<[-~]?"([a-z_]\w*)"[\r\n](?:.*[\r\n])*?[\t ]*\1"#)?
            .alias("heredoc-string")
            .greedy()
            .inside(grammar::extend(
                &heredoc_delimiter(
                    r#"(?i)^<<[-~]?"[a-z_]\w*"|[a-z_]\w*$"#,
                    r#"^<<[-~]?"|"$"#,
                )?,
                interpolation()?,
            )),
    );
    Ok(rules)
}

/// Create the Ruby grammar on top of `clike`
pub fn ruby_grammar(clike: &Grammar) -> Result<Grammar> {
    let ruby = grammar::extend(
        clike,
        Grammar::new()
            .token(
                "comment",
                vec![
                    PatternRule::new(r"#.*")?,
                    PatternRule::new(r"(?m)(?:^|(?<=\r))=begin\s[\s\S]*?(?:^|(?<=\r))=end")?.greedy(),
                ],
            )
            .token(
                "class-name",
                PatternRule::new(r"(?i)(\b(?:class)\s+|\bcatch\s+\()[\w.\\]+")?
                    .lookbehind()
                    .inside(Grammar::new().token("punctuation", PatternRule::new(r"[.\\]")?)),
            )
            .token(
                "keyword",
                PatternRule::new(
                    r"\b(?:alias|and|attr_accessor|attr_reader|attr_writer|BEGIN|begin|break|case|class|def|define_method|defined|do|each|else|elsif|END|end|ensure|extend|for|if|in|include|lambda|loop|module|new|next|nil|not|or|prepend|print|private|protected|public|puts|raise|redo|require|require_relative|rescue|retry|return|self|super|then|throw|undef|unless|until|when|while|yield)\b",
                )?,
            )
            .token(
                "operator",
                PatternRule::new(
                    r"\.{2,3}|&\.|===|<?=>|[!=]?~|(?:&&|\|\||<<|>>|\*\*|[+\-*/%<>!^&|=])=?|([?:$@])",
                )?,
            )
            .token("punctuation", PatternRule::new(r"[(){}\[\];.,]")?),
    );

    let mut ruby = grammar::insert_before(
        &ruby,
        "number",
        Grammar::new()
            .token(
                "builtin",
                PatternRule::new(
                    r"\b(?:Array|Bignum|Binding|Class|Continuation|Dir|Exception|FalseClass|File|Fixnum|Float|Hash|Integer|IO|MatchData|Method|Module|NilClass|Numeric|Object|Proc|Range|Regexp|String|Struct|Symbol|TMS|Thread|ThreadGroup|Time|TrueClass)\b",
                )?,
            )
            .token("constant", PatternRule::new(r"\b[A-Z]\w*(?:[?!]|\b)")?),
    );

    ruby.set("string", strings()?);
    Ok(ruby)
}
