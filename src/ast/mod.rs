use std::fmt::{self, Debug, Display, Formatter};

pub mod ident;
pub mod tree;

pub use self::ident::{Symbol, SymbolTable};
pub use self::tree::{BinOp, BinOpKind, Expr, UnaryOp};
pub use crate::alloc::Allocator;

/// A source location, used for diagnostics.
///
/// Lines are 1-based; the column of a token is the 1-based column of its
/// first character.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    /// The position of the very first character of the input.
    pub const START: SourcePos = SourcePos { line: 1, column: 1 };
}

impl Debug for SourcePos {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}
impl Display for SourcePos {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Access the [SourcePos] of an item.
pub trait Positioned {
    fn pos(&self) -> SourcePos;
}
