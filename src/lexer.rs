//! The tokenizer for tul source code.
//!
//! A single character of lookahead drives the scan; there is no
//! backtracking. Recoverable problems (overlong identifiers, unrecognized
//! characters, literal overflow) go to the [Diagnostics] sink and the scan
//! continues; only host-allocator exhaustion is fatal.
use std::fmt::{self, Display, Formatter, Write};
use std::str::Chars;

use arrayvec::ArrayString;

use crate::alloc::{StackArena, StrHandle};
use crate::ast::SourcePos;
use crate::errors::Diagnostics;

/// The longest identifier the tokenizer will store, in characters.
pub const MAX_IDENT_LEN: usize = 31;

/// A single token.
///
/// Identifier payloads are handles into the owning [TokenList]'s string
/// arena. Multi-character operators are distinct variants, so they can
/// never collide with the raw single-character fallback [Token::Sym].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// An identifier, stored in the token list's string arena
    Ident(StrHandle),
    /// An integer literal
    Int(u64),
    /// `==`
    DoubleEquals,
    /// `!=`
    NotEquals,
    /// `>=`
    GreaterEquals,
    /// `<=`
    LessEquals,
    /// `->`
    Arrow,
    /// `&&`
    DoubleAmp,
    /// `||`
    DoubleBar,
    /// `>>`
    RightShift,
    /// `<<`
    LeftShift,
    /// Any other single character (`+`, `(`, `=`, ...)
    Sym(char),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Token::Ident(_) => f.write_str("identifier"),
            Token::Int(value) => write!(f, "{}", value),
            Token::DoubleEquals => f.write_str("=="),
            Token::NotEquals => f.write_str("!="),
            Token::GreaterEquals => f.write_str(">="),
            Token::LessEquals => f.write_str("<="),
            Token::Arrow => f.write_str("->"),
            Token::DoubleAmp => f.write_str("&&"),
            Token::DoubleBar => f.write_str("||"),
            Token::RightShift => f.write_str(">>"),
            Token::LeftShift => f.write_str("<<"),
            Token::Sym(c) => f.write_char(c),
        }
    }
}

/// A token plus the position of its first character.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpannedToken {
    pub pos: SourcePos,
    pub kind: Token,
}

impl crate::ast::Positioned for SpannedToken {
    #[inline]
    fn pos(&self) -> SourcePos {
        self.pos
    }
}

/// The two-character operator table.
///
/// On a match both characters are consumed; on a miss the first character
/// alone becomes a [Token::Sym] and the second re-enters the scan loop.
const TWO_CHAR_OPERATORS: &[(char, char, Token)] = &[
    ('-', '>', Token::Arrow),
    ('=', '=', Token::DoubleEquals),
    ('>', '>', Token::RightShift),
    ('<', '<', Token::LeftShift),
    ('!', '=', Token::NotEquals),
    ('>', '=', Token::GreaterEquals),
    ('<', '=', Token::LessEquals),
    ('|', '|', Token::DoubleBar),
    ('&', '&', Token::DoubleAmp),
];

fn two_char_token(first: char, second: char) -> Option<Token> {
    TWO_CHAR_OPERATORS
        .iter()
        .find(|&&(a, b, _)| a == first && b == second)
        .map(|&(_, _, tk)| tk)
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// An append-only, indexable sequence of tokens.
///
/// Owns a [StackArena] dedicated to identifier text; write-once during
/// lexing and read-only afterward.
#[derive(Debug, Default)]
pub struct TokenList {
    tokens: Vec<SpannedToken>,
    strings: StackArena,
}

impl TokenList {
    #[inline]
    pub fn new() -> Self {
        TokenList::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&SpannedToken> {
        self.tokens.get(index)
    }

    #[inline]
    pub fn kind(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).map(|tk| tk.kind)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SpannedToken> {
        self.tokens.iter()
    }

    /// Resolve an identifier payload against the string arena.
    #[inline]
    pub fn ident_text(&self, handle: StrHandle) -> &str {
        self.strings.get_str(handle)
    }

    /// The string arena holding identifier payloads.
    #[inline]
    pub fn string_arena(&self) -> &StackArena {
        &self.strings
    }

    fn push(&mut self, pos: SourcePos, kind: Token) {
        self.tokens.push(SpannedToken { pos, kind });
    }

    fn alloc_ident(&mut self, text: &str) -> StrHandle {
        self.strings.alloc_str(text)
    }

    /// Render the sequence back to text, one space between lexemes.
    ///
    /// Re-tokenizing the result reproduces the same kinds and payloads.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, tok) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match tok.kind {
                Token::Ident(handle) => out.push_str(self.ident_text(handle)),
                // Display never needs the arena for the other kinds
                kind => {
                    let _ = write!(out, "{}", kind);
                }
            }
        }
        out
    }
}

/// The tokenizer state machine.
pub struct Lexer<'src, 'd> {
    chars: Chars<'src>,
    line: u32,
    column: u32,
    tokens: TokenList,
    diagnostics: &'d mut Diagnostics,
}

impl<'src, 'd> Lexer<'src, 'd> {
    pub fn new(text: &'src str, diagnostics: &'d mut Diagnostics) -> Self {
        Lexer {
            chars: text.chars(),
            line: 1,
            column: 0,
            tokens: TokenList::new(),
            diagnostics,
        }
    }

    /// Consume the whole input and return the token sequence.
    ///
    /// Never aborts on a recoverable lexical issue; problems are reported
    /// to the diagnostics sink and the scan continues.
    pub fn run(mut self) -> TokenList {
        let mut current = self.next_char();
        while let Some(c) = current {
            current = if is_ident_start(c) {
                self.lex_identifier(c)
            } else if c.is_ascii_digit() {
                self.lex_integer(c)
            } else if matches!(c, ' ' | '\t' | '\r' | '\n') {
                self.next_char()
            } else if c.is_ascii_punctuation() {
                self.lex_operator(c)
            } else {
                self.diagnostics
                    .error(self.pos(), format!("Unrecognized character {:?}.", c));
                self.next_char()
            };
        }
        self.tokens
    }

    /// Read one character, advancing the line/column counters.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// The position of the most recently read character.
    #[inline]
    fn pos(&self) -> SourcePos {
        SourcePos {
            line: self.line,
            column: self.column,
        }
    }

    /// Scan an identifier run. Returns the first character after the run.
    ///
    /// Runs longer than [MAX_IDENT_LEN] are consumed in full but stored
    /// truncated, with a single lexical error reported.
    fn lex_identifier(&mut self, first: char) -> Option<char> {
        let pos = self.pos();
        let mut text = ArrayString::<MAX_IDENT_LEN>::new();
        // The first character always fits
        let _ = text.try_push(first);
        let mut truncated = false;
        let next = loop {
            match self.next_char() {
                Some(c) if is_ident_continue(c) => {
                    if text.try_push(c).is_err() && !truncated {
                        truncated = true;
                        self.diagnostics.error(
                            pos,
                            format!(
                                "Identifiers cannot be longer than {} characters.",
                                MAX_IDENT_LEN
                            ),
                        );
                    }
                }
                other => break other,
            }
        };
        let handle = self.tokens.alloc_ident(&text);
        self.tokens.push(pos, Token::Ident(handle));
        next
    }

    /// Scan an integer literal. Returns the first character after it.
    ///
    /// Underscores inside the run are digit separators and ignored.
    fn lex_integer(&mut self, first: char) -> Option<char> {
        let pos = self.pos();
        let mut value = first as u64 - '0' as u64;
        let mut overflowed = false;
        let next = loop {
            match self.next_char() {
                Some('_') => continue,
                Some(c) if c.is_ascii_digit() => {
                    let digit = c as u64 - '0' as u64;
                    match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                        Some(v) => value = v,
                        None => {
                            if !overflowed {
                                overflowed = true;
                                self.diagnostics
                                    .error(pos, "Integer literal is too large.".to_string());
                            }
                            value = u64::MAX;
                        }
                    }
                }
                other => break other,
            }
        };
        self.tokens.push(pos, Token::Int(value));
        next
    }

    /// Scan an operator. Returns the character the scan should resume at.
    ///
    /// On a two-character match both characters are consumed; otherwise the
    /// first character becomes a raw token and the second character (if
    /// any) is handed back to the main loop. Only the second character is
    /// ever retried.
    fn lex_operator(&mut self, first: char) -> Option<char> {
        let pos = self.pos();
        let second = self.next_char();
        if let Some(d) = second {
            if let Some(kind) = two_char_token(first, d) {
                self.tokens.push(pos, kind);
                return self.next_char();
            }
        }
        self.tokens.push(pos, Token::Sym(first));
        second
    }
}

/// Tokenize `text`, reporting recoverable problems to `diagnostics`.
pub fn tokenize(text: &str, diagnostics: &mut Diagnostics) -> TokenList {
    Lexer::new(text, diagnostics).run()
}
