//! The expression parser: a strict precedence cascade.
//!
//! Every level has the same left-associative shape: parse the left operand
//! with the next (tighter-binding) level, then loop while the current
//! token is in the level's operator set, combining into a binary node.
//! The chain runs assignment → logical → equality → relational → additive
//! → multiplicative → modulo/xor → bitwise → shift → atom.
//!
//! Compound assignment is token-pair based: any binary operator token that
//! has a compound form and is immediately followed by a `=` token belongs
//! to the assignment level, so the inner levels must not consume it.
use crate::ast::tree::{BinOp, BinOpKind, Expr, UnaryOp};
use crate::errors::ParseError;
use crate::lexer::Token;

use super::Parser;

/// Map a token to the plain binary operator it spells.
///
/// Total over every level's operator set; tokens outside all sets map to
/// `None` and simply end the level's loop.
fn binary_kind(token: Token) -> Option<BinOpKind> {
    Some(match token {
        Token::Sym('+') => BinOpKind::Add,
        Token::Sym('-') => BinOpKind::Sub,
        Token::Sym('*') => BinOpKind::Mul,
        Token::Sym('/') => BinOpKind::Div,
        Token::Sym('%') => BinOpKind::Mod,
        Token::Sym('^') => BinOpKind::Xor,
        Token::LeftShift => BinOpKind::Shl,
        Token::RightShift => BinOpKind::Shr,
        Token::Sym('|') => BinOpKind::BitOr,
        Token::Sym('&') => BinOpKind::BitAnd,
        Token::DoubleBar => BinOpKind::Or,
        Token::DoubleAmp => BinOpKind::And,
        Token::DoubleEquals => BinOpKind::Eq,
        Token::NotEquals => BinOpKind::Ne,
        Token::Sym('>') => BinOpKind::Gt,
        Token::Sym('<') => BinOpKind::Lt,
        Token::GreaterEquals => BinOpKind::Ge,
        Token::LessEquals => BinOpKind::Le,
        Token::Sym('=') => BinOpKind::Assign,
        _ => return None,
    })
}

fn unary_kind(token: Token) -> Option<UnaryOp> {
    Some(match token {
        Token::Sym('-') => UnaryOp::Neg,
        Token::Sym('+') => UnaryOp::Pos,
        Token::Sym('*') => UnaryOp::Deref,
        Token::Sym('&') => UnaryOp::AddrOf,
        Token::Sym('!') => UnaryOp::Not,
        Token::Sym('~') => UnaryOp::BitNot,
        _ => return None,
    })
}

const LOGICAL: &[BinOpKind] = &[BinOpKind::And, BinOpKind::Or];
const EQUALITY: &[BinOpKind] = &[BinOpKind::Eq, BinOpKind::Ne];
const RELATIONAL: &[BinOpKind] = &[BinOpKind::Gt, BinOpKind::Lt, BinOpKind::Ge, BinOpKind::Le];
const ADDITIVE: &[BinOpKind] = &[BinOpKind::Add, BinOpKind::Sub];
const MULTIPLICATIVE: &[BinOpKind] = &[BinOpKind::Mul, BinOpKind::Div];
const MOD_XOR: &[BinOpKind] = &[BinOpKind::Mod, BinOpKind::Xor];
const BITWISE: &[BinOpKind] = &[BinOpKind::BitAnd, BinOpKind::BitOr];
const SHIFT: &[BinOpKind] = &[BinOpKind::Shr, BinOpKind::Shl];

impl<'a, 't, 's> Parser<'a, 't, 's> {
    /// Parse a full expression (the outermost cascade level).
    pub fn expression(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.assignment()
    }

    /// Level 1: `=`, or any compound-capable operator followed by `=`.
    ///
    /// Both tokens of a compound pair are consumed. Like every other
    /// level this loops left-associatively, so `x = y = 1` nests as
    /// `(x = y) = 1`.
    fn assignment(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        let mut lhs = self.logical()?;
        loop {
            let op = match self.peek() {
                Some(Token::Sym('=')) => {
                    self.skip();
                    BinOp::ASSIGN
                }
                Some(tk) if matches!(self.look_ahead(1), Some(Token::Sym('='))) => {
                    match binary_kind(tk).filter(|kind| kind.is_compound_base()) {
                        Some(base) => {
                            self.skip();
                            self.skip();
                            BinOp::compound(base)
                        }
                        None => break,
                    }
                }
                _ => break,
            };
            let rhs = self.logical()?;
            lhs = Expr::binary(self.arena(), op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    /// Level 2: `&&`, `||`.
    fn logical(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(LOGICAL, Self::equality)
    }

    /// Level 3: `==`, `!=`.
    fn equality(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(EQUALITY, Self::relational)
    }

    /// Level 4: `>`, `<`, `>=`, `<=`.
    fn relational(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(RELATIONAL, Self::additive)
    }

    /// Level 5: `+`, `-`.
    fn additive(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(ADDITIVE, Self::multiplicative)
    }

    /// Level 6: `*`, `/`.
    fn multiplicative(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(MULTIPLICATIVE, Self::mod_xor)
    }

    /// Level 7: `%`, `^`.
    fn mod_xor(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(MOD_XOR, Self::bitwise)
    }

    /// Level 8: `&`, `|`.
    fn bitwise(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(BITWISE, Self::shift)
    }

    /// Level 9: `>>`, `<<`.
    fn shift(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        self.binary_level(SHIFT, Self::atom)
    }

    /// The shared shape of levels 2-9.
    fn binary_level(
        &mut self,
        ops: &[BinOpKind],
        next: fn(&mut Self) -> Result<&'a Expr<'a>, ParseError>,
    ) -> Result<&'a Expr<'a>, ParseError> {
        let mut lhs = next(self)?;
        loop {
            let kind = match self.peek().and_then(binary_kind) {
                Some(kind) if ops.contains(&kind) => kind,
                _ => break,
            };
            // An `op =` pair is a compound assignment; leave it for level 1
            if kind.is_compound_base() && matches!(self.look_ahead(1), Some(Token::Sym('='))) {
                break;
            }
            self.skip();
            let rhs = next(self)?;
            lhs = Expr::binary(self.arena(), BinOp::plain(kind), lhs, rhs)?;
        }
        Ok(lhs)
    }

    /// Level 10: identifier, integer literal, parenthesized expression,
    /// or a unary prefix operator (`- + * & ! ~`) applied to an atom.
    fn atom(&mut self) -> Result<&'a Expr<'a>, ParseError> {
        match self.peek() {
            Some(Token::Ident(handle)) => {
                self.skip();
                let text = self.tokens().ident_text(handle);
                let name = self.symbols().intern(text)?;
                Ok(Expr::name(self.arena(), name)?)
            }
            Some(Token::Int(value)) => {
                self.skip();
                Ok(Expr::int(self.arena(), value)?)
            }
            Some(Token::Sym('(')) => {
                self.skip();
                let inner = self.expression()?;
                self.expect(Token::Sym(')'))?;
                Ok(inner)
            }
            Some(tk) => match unary_kind(tk) {
                Some(op) => {
                    self.skip();
                    let operand = self.atom()?;
                    Ok(Expr::unary(self.arena(), op, operand)?)
                }
                None => Err(self.unexpected(&"an expression")),
            },
            None => Err(self.unexpected(&"an expression")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::alloc::{AllocError, Allocator};
    use crate::ast::SymbolTable;
    use crate::errors::Diagnostics;
    use crate::{parse, ParseMode};
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    fn render(text: &str) -> String {
        let arena = Allocator::new(Bump::new());
        let mut symbols = SymbolTable::new(&arena);
        let mut diagnostics = Diagnostics::new();
        let root = parse(&arena, text, ParseMode::Expression, &mut symbols, &mut diagnostics)
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", text, e));
        assert!(!diagnostics.has_errors(), "unexpected lex diagnostics");
        root.to_string()
    }

    fn parse_err(text: &str) -> ParseError {
        let arena = Allocator::new(Bump::new());
        let mut symbols = SymbolTable::new(&arena);
        let mut diagnostics = Diagnostics::new();
        match parse(&arena, text, ParseMode::Expression, &mut symbols, &mut diagnostics) {
            Ok(tree) => panic!("expected an error for {:?}, got {}", text, tree),
            Err(e) => e,
        }
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert_eq!(render("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(render("1 * 2 + 3"), "((1 * 2) + 3)");
        assert_eq!(render("8 / 2 / 2"), "((8 / 2) / 2)");
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(render("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(render("((x))"), "x");
    }

    #[test]
    fn logical_binds_looser_than_equality() {
        assert_eq!(render("a == b && c == d"), "((a == b) && (c == d))");
        assert_eq!(render("a || b && c"), "((a || b) && c)");
    }

    #[test]
    fn relational_binds_looser_than_additive() {
        assert_eq!(render("a + 1 < b"), "((a + 1) < b)");
        assert_eq!(render("a >= b - 2"), "(a >= (b - 2))");
    }

    #[test]
    fn declared_chain_order_for_the_inner_levels() {
        // modulo/xor is looser than bitwise, bitwise looser than shift
        assert_eq!(render("a % b & c"), "(a % (b & c))");
        assert_eq!(render("a & b << c"), "(a & (b << c))");
        assert_eq!(render("a ^ b | c >> 1"), "(a ^ (b | (c >> 1)))");
    }

    #[test]
    fn unary_operators() {
        assert_eq!(render("-x + ~y"), "((-x) + (~y))");
        assert_eq!(render("!*p"), "(!(*p))");
        assert_eq!(render("&x"), "(&x)");
        assert_eq!(render("- 5"), "(-5)");
        assert_eq!(render("*(p + 1)"), "(*(p + 1))");
    }

    #[test]
    fn plain_assignment_decodes_without_a_base() {
        let arena = Allocator::new(Bump::new());
        let mut symbols = SymbolTable::new(&arena);
        let mut diagnostics = Diagnostics::new();
        let root = parse(
            &arena,
            "x = 1",
            ParseMode::Expression,
            &mut symbols,
            &mut diagnostics,
        )
        .unwrap();
        match *root {
            Expr::Binary { op, .. } => {
                assert!(op.is_assignment());
                assert_eq!(op.assign_base(), None);
            }
            ref other => panic!("expected a binary node, got {}", other),
        }
    }

    #[test]
    fn compound_assignment_decodes_to_its_base() {
        let arena = Allocator::new(Bump::new());
        let mut symbols = SymbolTable::new(&arena);
        let mut diagnostics = Diagnostics::new();
        let root = parse(
            &arena,
            "x += 1",
            ParseMode::Expression,
            &mut symbols,
            &mut diagnostics,
        )
        .unwrap();
        match *root {
            Expr::Binary { op, .. } => {
                assert!(op.is_assignment());
                assert_eq!(op.assign_base(), Some(BinOpKind::Add));
            }
            ref other => panic!("expected a binary node, got {}", other),
        }
    }

    #[test]
    fn compound_assignment_forms() {
        assert_eq!(render("x <<= 2"), "(x <<= 2)");
        assert_eq!(render("x >>= 2"), "(x >>= 2)");
        assert_eq!(render("flags &&= mask"), "(flags &&= mask)");
        assert_eq!(render("flags ||= mask"), "(flags ||= mask)");
        assert_eq!(render("x ^= y | 1"), "(x ^= (y | 1))");
        // Compound assignment pairs at the token level, as in the
        // original, so whitespace between the operator and `=` is allowed
        assert_eq!(render("x + = 1"), "(x += 1)");
    }

    #[test]
    fn assignment_loops_left_associatively() {
        assert_eq!(render("x = y = 1"), "((x = y) = 1)");
        assert_eq!(render("x = y + 1 = z"), "((x = (y + 1)) = z)");
    }

    #[test]
    fn assignment_right_hand_side_runs_the_full_cascade() {
        assert_eq!(render("x += y * 2"), "(x += (y * 2))");
        assert_eq!(render("x = a && b == c"), "(x = (a && (b == c)))");
    }

    #[test]
    fn cursor_consumes_exactly_the_expression() {
        let mut diagnostics = Diagnostics::new();
        let tokens = crate::lexer::tokenize("a + b * (c - 1)", &mut diagnostics);
        let arena = Allocator::new(Bump::new());
        let mut symbols = SymbolTable::new(&arena);
        let mut parser = Parser::new(&arena, &tokens, &mut symbols);
        parser.expression().unwrap();
        assert_eq!(parser.position(), tokens.len());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(
            parse_err(""),
            ParseError::UnexpectedEof {
                expected: "an expression".to_string()
            }
        );
    }

    #[test]
    fn trailing_operator_is_an_error() {
        assert_eq!(
            parse_err("1 +"),
            ParseError::UnexpectedEof {
                expected: "an expression".to_string()
            }
        );
    }

    #[test]
    fn stray_tokens_are_errors() {
        assert!(matches!(
            parse_err(")"),
            ParseError::UnexpectedToken { .. }
        ));
        // A complete expression followed by garbage
        match parse_err("a b") {
            ParseError::UnexpectedToken { expected, actual, .. } => {
                assert_eq!(expected, "end of input");
                assert_eq!(actual, "identifier 'b'");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unclosed_parenthesis_is_an_error() {
        assert_eq!(
            parse_err("(a + 1"),
            ParseError::UnexpectedEof {
                expected: "')'".to_string()
            }
        );
    }

    #[test]
    fn exhausted_arena_surfaces_as_a_parse_error() {
        let mut arena = Allocator::new(Bump::new());
        arena.set_limit(8);
        let mut symbols = SymbolTable::new(&arena);
        let mut diagnostics = Diagnostics::new();
        let err = parse(
            &arena,
            "a + b",
            ParseMode::Expression,
            &mut symbols,
            &mut diagnostics,
        )
        .unwrap_err();
        assert_eq!(err, ParseError::AllocationFailed(AllocError));
    }
}
