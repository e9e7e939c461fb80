//! Property-based tests for the tokenizer
//!
//! Whatever the input, the token tree must spell it out unchanged and
//! tokenizing twice must give the same tree.

use std::sync::OnceLock;
use std::thread;

use proptest::prelude::*;
use typolex::syntax::tokens::text_of;
use typolex::syntax::Highlighter;

fn highlighter() -> &'static Highlighter {
    static HIGHLIGHTER: OnceLock<Highlighter> = OnceLock::new();
    HIGHLIGHTER.get_or_init(|| Highlighter::new().expect("built-in grammars compile"))
}

/// Text dense in Markdown syntax
fn markdown_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("**".to_string()),
            Just("```ruby\n".to_string()),
            Just("\n```".to_string()),
            Just("# ".to_string()),
            Just("[link](http://x.y)".to_string()),
            Just("---\n".to_string()),
            "[*_`~#>|\\-\\\\\\[\\]()!<>\n ]".prop_map(String::from),
            "[a-z ]{1,6}",
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

/// Text dense in Ruby syntax
fn ruby_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("puts ".to_string()),
            Just("#{".to_string()),
            Just("<<~EOS\n".to_string()),
            Just("\nEOS\n".to_string()),
            Just("%w[".to_string()),
            "[\"'#{}()\\[\\]%=<>\n ]".prop_map(String::from),
            "[A-Za-z0-9_ ]{1,6}",
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn markdown_is_lossless(source in markdown_strategy()) {
        let tokens = highlighter().tokenize(&source, "markdown");
        prop_assert_eq!(text_of(&tokens), source);
    }

    #[test]
    fn ruby_is_lossless(source in ruby_strategy()) {
        let tokens = highlighter().tokenize(&source, "ruby");
        prop_assert_eq!(text_of(&tokens), source);
    }

    #[test]
    fn any_text_is_lossless(source in "\\PC{0,64}", language in prop_oneof![Just("md"), Just("rb"), Just("html")]) {
        let tokens = highlighter().tokenize(&source, language);
        prop_assert_eq!(text_of(&tokens), source);
    }

    #[test]
    fn tokenizing_is_deterministic(source in markdown_strategy()) {
        let first = highlighter().tokenize(&source, "markdown");
        let second = highlighter().tokenize(&source, "markdown");
        prop_assert_eq!(first, second);
    }
}

#[test]
fn concurrent_calls_agree() {
    let source = "# Title\n\n```ruby\nputs \"hi #{name}\"\n```\n**bold *it***\n";
    let expected = highlighter().tokenize(source, "markdown");

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(move || highlighter().tokenize(source, "markdown")))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
