//! Handling of identifiers
use std::borrow::Borrow;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use hashbrown::HashMap;

use crate::alloc::{AllocError, Allocator};

/// An interned identifier.
///
/// Basically just a pointer to a string with arena lifetime. Symbols for
/// the same text within one [SymbolTable] share their storage.
#[derive(Copy, Clone, Eq)]
pub struct Symbol<'a>(&'a str);

impl<'a> Symbol<'a> {
    /// The underlying text of this symbol
    #[inline]
    pub fn text(&self) -> &'a str {
        self.0
    }
}
impl PartialEq for Symbol<'_> {
    #[inline]
    fn eq(&self, other: &Symbol) -> bool {
        self.0 == other.0
    }
}
impl PartialEq<str> for Symbol<'_> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
impl Hash for Symbol<'_> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}
impl Borrow<str> for Symbol<'_> {
    #[inline]
    fn borrow(&self) -> &str {
        self.0
    }
}
impl AsRef<str> for Symbol<'_> {
    #[inline]
    fn as_ref(&self) -> &str {
        self.0
    }
}
impl Debug for Symbol<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
impl Display for Symbol<'_> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A set of interned strings, used to ensure that [Symbol]s are unique.
pub struct SymbolTable<'a> {
    arena: &'a Allocator,
    map: HashMap<&'a str, ()>,
}

impl<'a> SymbolTable<'a> {
    #[inline]
    pub fn new(arena: &'a Allocator) -> Self {
        SymbolTable {
            arena,
            map: HashMap::new(),
        }
    }

    /// Intern the specified text, reusing existing memory if possible.
    ///
    /// Does not check for validity.
    pub fn intern(&mut self, text: &str) -> Result<Symbol<'a>, AllocError> {
        if let Some((&existing, _)) = self.map.get_key_value(text) {
            return Ok(Symbol(existing));
        }
        let stored = self.arena.alloc_str(text)?;
        self.map.insert(stored, ());
        Ok(Symbol(stored))
    }

    /// The number of distinct symbols interned so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interning_deduplicates() {
        let arena = Allocator::new(bumpalo::Bump::new());
        let mut table = SymbolTable::new(&arena);
        let a = table.intern("counter").unwrap();
        let b = table.intern("counter").unwrap();
        let c = table.intern("other").unwrap();
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.text(), b.text()));
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
        assert_eq!(a.text(), "counter");
    }
}
