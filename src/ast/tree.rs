//! The expression tree and its operator encodings.
//!
//! Nodes are a closed set of variants allocated from an [Allocator]; the
//! tree has no back-edges and every subtree has exactly one parent. The
//! only capability a node exposes is rendering itself (and recursively its
//! children) to text, via [Display].
use std::fmt::{self, Display, Formatter};

use crate::alloc::{AllocError, Allocator};
use crate::ast::ident::Symbol;

/// A plain binary operator.
///
/// The discriminant order matters: it is the ordinal space that
/// [BinOp::tag] folds compound assignments into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Xor,
    Shl,
    Shr,
    BitOr,
    BitAnd,
    Or,
    And,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Assign,
}

impl BinOpKind {
    /// Whether `op=` is a valid compound assignment for this operator.
    #[inline]
    pub fn is_compound_base(self) -> bool {
        use BinOpKind::*;
        matches!(
            self,
            Add | Sub | Mul | Div | Mod | Xor | Shl | Shr | BitOr | BitAnd | Or | And
        )
    }

    fn from_ordinal(ordinal: u8) -> Option<BinOpKind> {
        use BinOpKind::*;
        Some(match ordinal {
            0 => Add,
            1 => Sub,
            2 => Mul,
            3 => Div,
            4 => Mod,
            5 => Xor,
            6 => Shl,
            7 => Shr,
            8 => BitOr,
            9 => BitAnd,
            10 => Or,
            11 => And,
            12 => Eq,
            13 => Ne,
            14 => Gt,
            15 => Lt,
            16 => Ge,
            17 => Le,
            18 => Assign,
            _ => return None,
        })
    }
}

impl Display for BinOpKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
            BinOpKind::Xor => "^",
            BinOpKind::Shl => "<<",
            BinOpKind::Shr => ">>",
            BinOpKind::BitOr => "|",
            BinOpKind::BitAnd => "&",
            BinOpKind::Or => "||",
            BinOpKind::And => "&&",
            BinOpKind::Eq => "==",
            BinOpKind::Ne => "!=",
            BinOpKind::Gt => ">",
            BinOpKind::Lt => "<",
            BinOpKind::Ge => ">=",
            BinOpKind::Le => "<=",
            BinOpKind::Assign => "=",
        })
    }
}

/// A binary operator, possibly combined with assignment.
///
/// This is the double-width tag space of the original encoding made total:
/// the lower half of [BinOp::tag] enumerates the plain operators up to and
/// including plain assignment, and the upper half reuses the same ordinals
/// (offset by `Assign`'s ordinal) to mean "compound assignment with this
/// base operator". The upper half is only ever produced for operators that
/// are valid compound bases.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BinOp {
    kind: BinOpKind,
    assign: bool,
}

impl BinOp {
    /// Plain assignment (`=`).
    pub const ASSIGN: BinOp = BinOp {
        kind: BinOpKind::Assign,
        assign: true,
    };

    /// A plain (non-assigning) operator.
    #[inline]
    pub fn plain(kind: BinOpKind) -> BinOp {
        BinOp {
            assign: kind == BinOpKind::Assign,
            kind,
        }
    }

    /// A compound assignment (`base=`).
    ///
    /// `base` must be a valid compound base, i.e. one of
    /// `+ - * / % ^ | & && || >> <<`.
    #[inline]
    pub fn compound(base: BinOpKind) -> BinOp {
        debug_assert!(base.is_compound_base(), "invalid compound base {:?}", base);
        BinOp { kind: base, assign: true }
    }

    /// The base operator; `Assign` for plain assignment.
    #[inline]
    pub fn kind(&self) -> BinOpKind {
        self.kind
    }

    /// Whether this operator writes to its left operand.
    #[inline]
    pub fn is_assignment(&self) -> bool {
        self.assign
    }

    /// The base operator of a compound assignment, or `None` for both
    /// plain assignment and non-assigning operators.
    #[inline]
    pub fn assign_base(&self) -> Option<BinOpKind> {
        if self.assign && self.kind != BinOpKind::Assign {
            Some(self.kind)
        } else {
            None
        }
    }

    /// Encode into the double-width ordinal space.
    #[inline]
    pub fn tag(&self) -> u8 {
        match self.assign_base() {
            Some(base) => BinOpKind::Assign as u8 + base as u8,
            None => self.kind as u8,
        }
    }

    /// Decode from the double-width ordinal space.
    ///
    /// Rejects upper-half tags whose base is not a valid compound base.
    pub fn from_tag(tag: u8) -> Option<BinOp> {
        const ASSIGN: u8 = BinOpKind::Assign as u8;
        if tag <= ASSIGN {
            Some(BinOp::plain(BinOpKind::from_ordinal(tag)?))
        } else {
            let base = BinOpKind::from_ordinal(tag - ASSIGN)?;
            if base.is_compound_base() {
                Some(BinOp::compound(base))
            } else {
                None
            }
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.assign_base() {
            Some(base) => write!(f, "{}=", base),
            None => Display::fmt(&self.kind, f),
        }
    }
}

/// A unary prefix operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Deref,
    AddrOf,
    Not,
    BitNot,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        })
    }
}

/// An expression node, allocated from an arena.
///
/// Child references share the lifetime of the owning arena; the tree is
/// write-once during the parse and read-only afterward.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Expr<'a> {
    /// A reference to a name
    Name(Symbol<'a>),
    /// An integer literal
    Int(u64),
    /// A binary operation, including (compound) assignment
    Binary {
        op: BinOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    /// A unary prefix operation
    Unary { op: UnaryOp, operand: &'a Expr<'a> },
}

impl<'a> Expr<'a> {
    pub fn name(arena: &'a Allocator, name: Symbol<'a>) -> Result<&'a Expr<'a>, AllocError> {
        Ok(arena.alloc(Expr::Name(name))?)
    }

    pub fn int(arena: &'a Allocator, value: u64) -> Result<&'a Expr<'a>, AllocError> {
        Ok(arena.alloc(Expr::Int(value))?)
    }

    pub fn binary(
        arena: &'a Allocator,
        op: BinOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    ) -> Result<&'a Expr<'a>, AllocError> {
        Ok(arena.alloc(Expr::Binary { op, lhs, rhs })?)
    }

    pub fn unary(
        arena: &'a Allocator,
        op: UnaryOp,
        operand: &'a Expr<'a>,
    ) -> Result<&'a Expr<'a>, AllocError> {
        Ok(arena.alloc(Expr::Unary { op, operand })?)
    }
}

impl Display for Expr<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Expr::Name(name) => Display::fmt(&name, f),
            Expr::Int(value) => write!(f, "{}", value),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Unary { op, operand } => write!(f, "({}{})", op, operand),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compound_tags_fold_into_the_upper_half() {
        let plus_equals = BinOp::compound(BinOpKind::Add);
        assert_eq!(
            plus_equals.tag(),
            BinOpKind::Assign as u8 + BinOpKind::Add as u8
        );
        assert!(plus_equals.is_assignment());
        assert_eq!(plus_equals.assign_base(), Some(BinOpKind::Add));

        let assign = BinOp::ASSIGN;
        assert_eq!(assign.tag(), BinOpKind::Assign as u8);
        assert!(assign.is_assignment());
        assert_eq!(assign.assign_base(), None);

        let shl = BinOp::plain(BinOpKind::Shl);
        assert!(!shl.is_assignment());
        assert_eq!(shl.tag(), BinOpKind::Shl as u8);
    }

    #[test]
    fn tag_decoding_rejects_invalid_bases() {
        // `==` has no compound form, so its upper-half tag is invalid
        let bad = BinOpKind::Assign as u8 + BinOpKind::Eq as u8;
        assert_eq!(BinOp::from_tag(bad), None);
        // Out of range entirely
        assert_eq!(BinOp::from_tag(2 * BinOpKind::Assign as u8 + 1), None);

        for op in &[
            BinOp::plain(BinOpKind::Mul),
            BinOp::plain(BinOpKind::Le),
            BinOp::ASSIGN,
            BinOp::compound(BinOpKind::Shr),
            BinOp::compound(BinOpKind::And),
        ] {
            assert_eq!(BinOp::from_tag(op.tag()), Some(*op));
        }
    }

    #[test]
    fn rendering_nests_children() {
        let arena = Allocator::new(bumpalo::Bump::new());
        let mut symbols = crate::ast::SymbolTable::new(&arena);
        let x = Expr::name(&arena, symbols.intern("x").unwrap()).unwrap();
        let one = Expr::int(&arena, 1).unwrap();
        let neg = Expr::unary(&arena, UnaryOp::Neg, one).unwrap();
        let sum = Expr::binary(&arena, BinOp::plain(BinOpKind::Add), x, neg).unwrap();
        let root = Expr::binary(&arena, BinOp::compound(BinOpKind::Shl), x, sum).unwrap();
        assert_eq!(root.to_string(), "(x <<= (x + (-1)))");
    }
}
