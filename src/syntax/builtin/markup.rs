//! Markup (HTML/XML) language definition
//!
//! Base table for Markdown, which inherits the tag rules so inline HTML
//! inside a document is highlighted too.

use crate::error::Result;
use crate::syntax::grammar::Grammar;
use crate::syntax::rules::{PatternRule, RuleSet};

/// Create the markup grammar
pub fn markup_grammar() -> Result<Grammar> {
    let tag_inside = Grammar::new()
        .token(
            "tag",
            PatternRule::new(r"^</?[^\s>/]+")?.inside(
                Grammar::new()
                    .token("punctuation", PatternRule::new(r"^</?")?)
                    .token("namespace", PatternRule::new(r"^[^\s>/:]+:")?),
            ),
        )
        .token(
            "attr-value",
            PatternRule::new(r#"=\s*(?:"[^"]*"|'[^']*'|[^\s'">=]+)"#)?.inside(
                Grammar::new()
                    .token(
                        "punctuation",
                        vec![
                            PatternRule::new(r"^=")?.alias("attr-equals"),
                            PatternRule::new(r#"^(\s*)["']|["']$"#)?.lookbehind(),
                        ],
                    )
                    .token("entity", entity()?),
            ),
        )
        .token("punctuation", PatternRule::new(r"/?>")?)
        .token(
            "attr-name",
            PatternRule::new(r"[^\s>/]+")?
                .inside(Grammar::new().token("namespace", PatternRule::new(r"^[^\s>/:]+:")?)),
        );

    let doctype_inside = Grammar::new()
        .token(
            "internal-subset",
            PatternRule::new(r"(^[^\[]*\[)[\s\S]+(?=\]>$)")?
                .lookbehind()
                .greedy()
                .inside_language("markup"),
        )
        .token("string", PatternRule::new(r#""[^"]*"|'[^']*'"#)?.greedy())
        .token("punctuation", PatternRule::new(r"^<!|>$|[\[\]]")?)
        .token("doctype-tag", PatternRule::new(r"(?i)^DOCTYPE")?)
        .token("name", PatternRule::new(r#"[^\s<>'"]+"#)?);

    Ok(Grammar::new()
        .token("comment", PatternRule::new(r"<!--(?:(?!<!--)[\s\S])*?-->")?.greedy())
        .token("prolog", PatternRule::new(r"<\?[\s\S]+?\?>")?.greedy())
        .token(
            "doctype",
            PatternRule::new(
                r#"(?i)<!DOCTYPE(?:[^>"'\[\]]|"[^"]*"|'[^']*')+(?:\[(?:[^<"'\]]|"[^"]*"|'[^']*'|<(?!!--)|<!--(?:[^-]|-(?!->))*-->)*\]\s*)?>"#,
            )?
            .greedy()
            .inside(doctype_inside),
        )
        .token("cdata", PatternRule::new(r"(?i)<!\[CDATA\[[\s\S]*?\]\]>")?.greedy())
        .token(
            "tag",
            PatternRule::new(
                r#"</?(?!\d)[^\s>/=$<%]+(?:\s(?:\s*[^\s>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s'">=]+(?=[\s>]))|(?=[\s/>])))+)?\s*/?>"#,
            )?
            .greedy()
            .inside(tag_inside),
        )
        .token("entity", entity()?))
}

/// `&amp;` style named and numeric character references
fn entity() -> Result<RuleSet> {
    Ok(RuleSet::Alternatives(vec![
        PatternRule::new(r"(?i)&[\da-z]{1,8};")?.alias("named-entity"),
        PatternRule::new(r"(?i)&#x?[\da-f]{1,8};")?,
    ]))
}
