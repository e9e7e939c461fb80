//! typolex - syntax highlighter for the terminal
//!
//! Reads a file (or stdin), tokenizes it and prints it colored, as HTML
//! or as a token dump.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use typolex::error::{HighlightError, Result};
use typolex::syntax::{dump_tree, AnsiRenderer, Highlighter};
use typolex::Config;

#[derive(Parser, Debug)]
#[command(name = "typolex")]
#[command(about = "Syntax highlighter for the terminal")]
#[command(version)]
struct Cli {
    /// File to highlight (reads stdin if omitted or `-`)
    file: Option<PathBuf>,

    /// Language or alias to highlight with
    #[arg(short, long = "lang", value_name = "NAME")]
    language: Option<String>,

    /// Print HTML instead of terminal colors
    #[arg(long, conflicts_with = "tokens")]
    html: bool,

    /// Print the token tree
    #[arg(long)]
    tokens: bool,

    /// Read settings from PATH instead of ~/.typolex.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List available languages
    #[arg(long)]
    list: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// What to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Ansi,
    Html,
    Tokens,
}

impl Cli {
    fn output(&self) -> Output {
        if self.html {
            Output::Html
        } else if self.tokens {
            Output::Tokens
        } else {
            Output::Ansi
        }
    }

    /// Input file, `None` for stdin
    fn input(&self) -> Option<&Path> {
        self.file.as_deref().filter(|path| *path != Path::new("-"))
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let highlighter = Highlighter::with_config(&config)?;

    if cli.list {
        for language in highlighter.registry().list_languages() {
            let aliases = highlighter.registry().aliases_of(language);
            if aliases.is_empty() {
                println!("{}", language);
            } else {
                println!("{} ({})", language, aliases.join(", "));
            }
        }
        return Ok(());
    }

    let source = match cli.input() {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let language = match &cli.language {
        Some(language) => language.clone(),
        None => cli
            .input()
            .and_then(|path| detect_language(&highlighter, path))
            .unwrap_or_else(|| config.default_language.clone()),
    };
    if !highlighter.registry().contains(&language) {
        return Err(HighlightError::UnknownGrammar(language));
    }
    debug!(language = %language, bytes = source.len(), "highlighting");

    match cli.output() {
        Output::Html => println!("{}", highlighter.highlight(&source, &language)),
        Output::Tokens => print!("{}", dump_tree(&highlighter.tokenize(&source, &language))),
        Output::Ansi => {
            let tokens = highlighter.tokenize(&source, &language);
            AnsiRenderer::default().render(&mut io::stdout().lock(), &tokens)?;
        }
    }
    Ok(())
}

/// Language for a file, from its extension
fn detect_language(highlighter: &Highlighter, path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "md" | "markdown" | "mkd" => "markdown",
        "rb" | "rake" | "gemspec" => "ruby",
        "html" | "htm" | "xml" | "svg" => "markup",
        other => highlighter.registry().canonical_name(other)?,
    };
    Some(language.to_string())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
