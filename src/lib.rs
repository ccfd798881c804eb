//! The front end of the tul language: a tokenizer and an
//! operator-precedence expression parser building an arena-allocated
//! syntax tree.
//!
//! The pipeline is sequential and single-threaded: raw text goes through
//! the [lexer] into a [lexer::TokenList] (which owns its own string
//! arena), and the [parse] module's cursor turns that into [ast::Expr]
//! nodes allocated from a caller-supplied [alloc::Allocator]. For
//! concurrent parsing, give every parse unit its own arena pair; arenas
//! are never shared across units.
pub mod alloc;
pub mod ast;
pub mod errors;
pub mod lexer;
pub mod parse;

use crate::alloc::Allocator;
use crate::ast::{Expr, SymbolTable};
use crate::errors::Diagnostics;

pub use crate::errors::ParseError;

/// The mode of operation to parse the code in
///
/// Indicates the top level item to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Expression,
}

/// Tokenize `text`, reporting recoverable lexical problems to the sink.
pub use crate::lexer::tokenize;

/// Parse `text` into a tree allocated from `arena`.
///
/// Lexical problems go to `diagnostics` and do not stop the parse; a
/// malformed token sequence or an exhausted arena produce a [ParseError].
/// The entire input must be consumed.
pub fn parse<'a>(
    arena: &'a Allocator,
    text: &str,
    mode: ParseMode,
    symbols: &mut SymbolTable<'a>,
    diagnostics: &mut Diagnostics,
) -> Result<&'a Expr<'a>, ParseError> {
    let tokens = lexer::tokenize(text, diagnostics);
    let mut parser = parse::Parser::new(arena, &tokens, symbols);
    match mode {
        ParseMode::Expression => {
            let res = parser.expression()?;
            parser.expect_end_of_input()?;
            Ok(res)
        }
    }
}
