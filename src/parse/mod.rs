//! The token cursor and expression parser.
//!
//! [Parser] is a cursor over a finished [TokenList]: the position starts
//! at zero and only ever increases. Statement and declaration parsing are
//! future consumers of the same cursor and node arena; today the only
//! entry point is the expression cascade in [expr].
use std::fmt::Display;

use crate::alloc::Allocator;
use crate::ast::{SourcePos, SymbolTable};
use crate::errors::ParseError;
use crate::lexer::{SpannedToken, Token, TokenList};

pub mod expr;

pub struct Parser<'a, 't, 's> {
    arena: &'a Allocator,
    symbols: &'s mut SymbolTable<'a>,
    tokens: &'t TokenList,
    position: usize,
}

impl<'a, 't, 's> Parser<'a, 't, 's> {
    pub fn new(
        arena: &'a Allocator,
        tokens: &'t TokenList,
        symbols: &'s mut SymbolTable<'a>,
    ) -> Self {
        Parser {
            arena,
            symbols,
            tokens,
            position: 0,
        }
    }

    /// The current cursor position; equals the number of tokens consumed.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn arena(&self) -> &'a Allocator {
        self.arena
    }

    #[inline]
    pub fn symbols(&mut self) -> &mut SymbolTable<'a> {
        self.symbols
    }

    #[inline]
    pub fn tokens(&self) -> &'t TokenList {
        self.tokens
    }

    /// The next token, without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<Token> {
        self.tokens.kind(self.position)
    }

    /// Look ahead `amount` tokens; `look_ahead(0)` is the same as `peek`.
    #[inline]
    pub fn look_ahead(&self, amount: usize) -> Option<Token> {
        self.tokens.kind(self.position + amount)
    }

    /// Consume and return the next token.
    #[inline]
    pub fn advance(&mut self) -> Option<SpannedToken> {
        match self.tokens.get(self.position) {
            Some(&tk) => {
                self.position += 1;
                Some(tk)
            }
            None => None,
        }
    }

    /// Skip over the next token without returning it.
    ///
    /// This should be used in conjunction with `peek`.
    #[inline]
    pub fn skip(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// The position of the next token, or of the last token at the end of
    /// input.
    pub fn current_pos(&self) -> SourcePos {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.get(self.tokens.len().wrapping_sub(1)))
            .map(|tk| tk.pos)
            .unwrap_or(SourcePos::START)
    }

    /// Check if the cursor has consumed every token.
    #[inline]
    pub fn is_end_of_input(&self) -> bool {
        self.position == self.tokens.len()
    }

    /// Consume the next token if it equals `expected`, erroring otherwise.
    pub fn expect(&mut self, expected: Token) -> Result<SpannedToken, ParseError> {
        match self.tokens.get(self.position) {
            Some(&tk) if tk.kind == expected => {
                self.position += 1;
                Ok(tk)
            }
            _ => Err(self.unexpected(&format!("'{}'", expected))),
        }
    }

    /// Expect that the parser has completely finished parsing its input.
    ///
    /// This is typically done at the end of a top-level (user-visible)
    /// parse function.
    pub fn expect_end_of_input(&mut self) -> Result<(), ParseError> {
        if self.is_end_of_input() {
            Ok(())
        } else {
            Err(self.unexpected(&"end of input"))
        }
    }

    #[cold]
    pub fn unexpected(&self, expected: &dyn Display) -> ParseError {
        match self.peek() {
            Some(tk) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                actual: match tk {
                    Token::Ident(handle) => {
                        format!("identifier '{}'", self.tokens.ident_text(handle))
                    }
                    other => format!("'{}'", other),
                },
                pos: self.current_pos(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }
}
