use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use bumpalo::Bump;
use clap::Parser;

use tul::alloc::Allocator;
use tul::ast::SymbolTable;
use tul::errors::{Diagnostics, Severity};
use tul::lexer::{Token, TokenList};
use tul::ParseMode;

/// Command line interface to the tul front end
///
/// Includes a small set of tools that are useful
/// during development of the language.
#[derive(Parser, Debug)]
#[clap(name = "tul", version)]
enum Opt {
    /// Tokenize a source file and print one line per token
    Tokenize(InputOptions),
    /// Parse a single expression and print its rendered tree
    ParseExpr(InputOptions),
}

fn main() -> anyhow::Result<()> {
    let options = Opt::parse();
    match options {
        Opt::Tokenize(ref inner) => tokenize(inner),
        Opt::ParseExpr(ref inner) => parse_expr(inner),
    }
}

fn tokenize(options: &InputOptions) -> anyhow::Result<()> {
    let text = options.read_input()?;
    let mut diagnostics = Diagnostics::new();
    let tokens = tul::tokenize(&text, &mut diagnostics);
    dump_tokens(&tokens);
    report(&diagnostics)
}

fn dump_tokens(tokens: &TokenList) {
    for tok in tokens.iter() {
        match tok.kind {
            Token::Ident(handle) => println!("[id]  {}", tokens.ident_text(handle)),
            Token::Int(value) => println!("[int] {}", value),
            Token::Sym(c) => println!("[#]   '{}'", c),
            named => println!("[op]  {}", named),
        }
    }
}

fn parse_expr(options: &InputOptions) -> anyhow::Result<()> {
    let text = options.read_input()?;
    let arena = Allocator::new(Bump::new());
    let mut symbols = SymbolTable::new(&arena);
    let mut diagnostics = Diagnostics::new();
    let tree = tul::parse(
        &arena,
        &text,
        ParseMode::Expression,
        &mut symbols,
        &mut diagnostics,
    );
    let tree = match tree {
        Ok(tree) => tree,
        Err(cause) => {
            report(&diagnostics)?;
            return Err(cause).context("Failed to parse input");
        }
    };
    println!("{}", tree);
    report(&diagnostics)
}

/// Print every diagnostic to stderr, failing if any was an error.
fn report(diagnostics: &Diagnostics) -> anyhow::Result<()> {
    for diagnostic in diagnostics.iter() {
        let tag = match diagnostic.severity {
            Severity::Error => "\x1b[0;31merror:\x1b[0;0m",
            Severity::Warning => "\x1b[0;35mwarning:\x1b[0;0m",
        };
        eprintln!("{} {} @ {}", tag, diagnostic.message, diagnostic.pos);
    }
    if diagnostics.has_errors() {
        bail!("Input contained lexical errors");
    }
    Ok(())
}

#[derive(clap::Args, Debug)]
struct InputOptions {
    /// The input source file (reads stdin when omitted)
    #[clap(value_hint = clap::ValueHint::FilePath)]
    input_file: Option<PathBuf>,
    /// Explicitly given input text
    #[clap(long = "text")]
    input_text: Option<String>,
}

impl InputOptions {
    fn read_input(&self) -> anyhow::Result<String> {
        if let Some(ref text) = self.input_text {
            return Ok(text.clone());
        }
        match self.input_file {
            Some(ref path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display())),
            None => {
                let mut res = String::new();
                std::io::stdin()
                    .read_to_string(&mut res)
                    .context("Unable to read stdin")?;
                Ok(res)
            }
        }
    }
}
