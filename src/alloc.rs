//! Arena allocation for the front end.
//!
//! Two allocators live here, matching the two jobs the front end has for
//! bulk memory:
//!
//! - [StackArena] is a grow-only byte arena that hands out *handles*
//!   (offset + length) instead of addresses. The token list uses it to
//!   store identifier text; growth can reallocate the backing buffer, but
//!   a handle re-resolves through the current buffer so it never dangles.
//! - [Allocator] wraps a [bumpalo::Bump] for typed allocations with arena
//!   lifetime (`&'a T`). The parser uses it for AST nodes and interned
//!   symbol text. Bump chunks never move, so references stay valid across
//!   growth.
//!
//! Neither supports per-object deallocation. Everything allocated during a
//! parse lives exactly as long as the parse.
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str;

use bumpalo::Bump;

/// Indicates the allocator is out of memory.
///
/// Either the backing allocator returned an error, or the total number of
/// allocated bytes exceeded the configured limit.
///
/// This is a marker error, which carries no data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AllocError;

impl Display for AllocError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("Allocation failed")
    }
}
impl Error for AllocError {}
impl From<bumpalo::AllocErr> for AllocError {
    #[inline]
    fn from(_cause: bumpalo::AllocErr) -> Self {
        AllocError
    }
}

/// The capacity rounding unit of a [StackArena].
pub const STACK_ARENA_ALIGNMENT: usize = 4096;

/// A handle to a byte run inside a [StackArena].
///
/// Handles stay valid across growth of the owning arena: they are resolved
/// against the current backing buffer on every access.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArenaHandle {
    offset: usize,
    len: usize,
}

impl ArenaHandle {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A handle to a UTF-8 byte run inside a [StackArena].
///
/// Only ever produced by [StackArena::alloc_str], which guarantees the
/// referenced bytes are valid UTF-8.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StrHandle(ArenaHandle);

impl StrHandle {
    /// The length of the referenced text, in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A grow-only bump arena over raw bytes.
///
/// The arena tracks a single bump offset; there is no freelist, so the
/// offset always equals the number of bytes in use. When an allocation
/// does not fit, the capacity is rounded up to the next multiple of
/// [STACK_ARENA_ALIGNMENT] and then grown by that unit until the request
/// fits. Contents written before a growth survive it unchanged.
///
/// Individual allocations are never released; [StackArena::release] drops
/// the whole buffer in one step.
#[derive(Debug, Default)]
pub struct StackArena {
    data: Vec<u8>,
}

impl StackArena {
    /// Create an empty arena with no backing storage.
    #[inline]
    pub fn new() -> Self {
        StackArena { data: Vec::new() }
    }

    /// Create an empty arena, pre-reserving `initial` bytes.
    ///
    /// A capacity of zero is legal and allocates nothing.
    #[inline]
    pub fn with_capacity(initial: usize) -> Self {
        StackArena {
            data: Vec::with_capacity(initial),
        }
    }

    /// The current bump offset, which equals the total bytes allocated.
    #[inline]
    pub fn offset(&self) -> usize {
        self.data.len()
    }

    /// The number of bytes in use. Always equal to [StackArena::offset].
    #[inline]
    pub fn used(&self) -> usize {
        self.data.len()
    }

    /// The reserved capacity of the backing buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Allocate `size` zero-initialized bytes.
    pub fn alloc_zeroed(&mut self, size: usize) -> ArenaHandle {
        self.grow_to_fit(size);
        let offset = self.data.len();
        self.data.resize(offset + size, 0);
        ArenaHandle { offset, len: size }
    }

    /// Allocate a copy of `bytes`.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> ArenaHandle {
        self.grow_to_fit(bytes.len());
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        ArenaHandle {
            offset,
            len: bytes.len(),
        }
    }

    /// Allocate a copy of `text`.
    #[inline]
    pub fn alloc_str(&mut self, text: &str) -> StrHandle {
        StrHandle(self.alloc_bytes(text.as_bytes()))
    }

    /// Resolve a handle against the current buffer.
    #[inline]
    pub fn get(&self, handle: ArenaHandle) -> &[u8] {
        &self.data[handle.offset..handle.offset + handle.len]
    }

    #[inline]
    pub fn get_mut(&mut self, handle: ArenaHandle) -> &mut [u8] {
        &mut self.data[handle.offset..handle.offset + handle.len]
    }

    /// Resolve a string handle against the current buffer.
    #[inline]
    pub fn get_str(&self, handle: StrHandle) -> &str {
        let bytes = self.get(handle.0);
        // Invariant: a StrHandle is only ever created from valid UTF-8
        unsafe { str::from_utf8_unchecked(bytes) }
    }

    /// Discard the entire buffer in one step.
    ///
    /// The arena becomes empty (capacity zero) and reusable.
    #[inline]
    pub fn release(&mut self) {
        self.data = Vec::new();
    }

    /// Reserve enough capacity for `extra` more bytes, rounding up in
    /// units of [STACK_ARENA_ALIGNMENT].
    fn grow_to_fit(&mut self, extra: usize) {
        let needed = self.data.len() + extra;
        let mut reserved = self.data.capacity();
        if needed <= reserved {
            return;
        }
        reserved += reserved.wrapping_neg() & (STACK_ARENA_ALIGNMENT - 1);
        while reserved < needed {
            reserved += STACK_ARENA_ALIGNMENT;
        }
        self.data.reserve_exact(reserved - self.data.len());
    }
}

/// A typed bump arena which carefully limits memory usage.
///
/// Objects handed out borrow the arena (`&'a T`) and are freed only when
/// the arena itself is dropped.
pub struct Allocator {
    limit: usize,
    arena: Bump,
}

impl Allocator {
    #[inline]
    pub fn new(arena: Bump) -> Self {
        Allocator {
            arena,
            limit: usize::MAX,
        }
    }

    /// Cap the total number of bytes this allocator may hand out.
    ///
    /// Exceeding the limit makes further allocations fail with
    /// [AllocError] instead of aborting.
    #[inline]
    pub fn set_limit(&mut self, limit: usize) -> &mut Self {
        assert!(
            limit >= self.arena.allocated_bytes(),
            "Limit {} is below the already allocated bytes",
            limit
        );
        self.limit = limit;
        self
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn into_inner(self) -> Bump {
        self.arena
    }

    #[inline]
    pub fn alloc<T>(&self, val: T) -> Result<&mut T, AllocError> {
        if std::mem::size_of::<T>() > self.remaining_bytes() {
            return Err(AllocError);
        }
        let ptr = self
            .arena
            .try_alloc_layout(std::alloc::Layout::new::<T>())?
            .as_ptr() as *mut T;
        unsafe {
            ptr.write(val);
            Ok(&mut *ptr)
        }
    }

    #[inline]
    pub fn alloc_str<'a>(&'a self, src: &str) -> Result<&'a str, AllocError> {
        if src.len() > self.remaining_bytes() {
            return Err(AllocError);
        }
        unsafe {
            let layout = std::alloc::Layout::for_value(src.as_bytes());
            let mem = self.arena.try_alloc_layout(layout)?.as_ptr();
            mem.copy_from_nonoverlapping(src.as_ptr(), src.len());
            let bytes = std::slice::from_raw_parts(mem, src.len());
            Ok(str::from_utf8_unchecked(bytes))
        }
    }

    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    /// The remaining number of bytes before the internal limit is reached.
    ///
    /// NOTE: The underlying limit may be [usize::MAX], in which case this
    /// returns a very large number.
    #[inline]
    pub fn remaining_bytes(&self) -> usize {
        self.limit.saturating_sub(self.arena.allocated_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn offset_tracks_sum_of_sizes() {
        let mut arena = StackArena::new();
        let sizes = [1usize, 7, 32, 4096, 3, 9000, 1];
        let mut total = 0;
        for &size in &sizes {
            arena.alloc_zeroed(size);
            total += size;
            assert_eq!(arena.offset(), total);
            assert_eq!(arena.used(), arena.offset());
        }
    }

    #[test]
    fn contents_survive_growth() {
        let mut arena = StackArena::with_capacity(0);
        let first = arena.alloc_bytes(b"hello");
        let text = arena.alloc_str("world");
        // Force several rounds of growth
        for _ in 0..64 {
            arena.alloc_zeroed(1024);
        }
        assert_eq!(arena.get(first), b"hello");
        assert_eq!(arena.get_str(text), "world");
    }

    #[test]
    fn capacity_rounds_to_alignment() {
        let mut arena = StackArena::new();
        arena.alloc_zeroed(1);
        assert!(arena.capacity() >= STACK_ARENA_ALIGNMENT);
        arena.alloc_zeroed(STACK_ARENA_ALIGNMENT);
        assert!(arena.capacity() >= 2 * STACK_ARENA_ALIGNMENT);
    }

    #[test]
    fn release_makes_arena_reusable() {
        let mut arena = StackArena::new();
        arena.alloc_bytes(b"junk");
        arena.release();
        assert_eq!(arena.offset(), 0);
        assert_eq!(arena.capacity(), 0);
        let handle = arena.alloc_str("fresh");
        assert_eq!(arena.get_str(handle), "fresh");
    }

    #[test]
    fn zeroed_allocation_is_zeroed() {
        let mut arena = StackArena::new();
        arena.alloc_bytes(&[0xFF; 16]);
        let zeroed = arena.alloc_zeroed(16);
        assert_eq!(arena.get(zeroed), &[0u8; 16][..]);
    }

    #[test]
    fn typed_arena_allocations() {
        let alloc = Allocator::new(bumpalo::Bump::new());
        let a = alloc.alloc(42u64).unwrap();
        let b = alloc.alloc_str("speak, friend").unwrap();
        assert_eq!(*a, 42);
        assert_eq!(b, "speak, friend");
        assert!(alloc.allocated_bytes() >= 8 + b.len());
    }

    #[test]
    fn limit_is_enforced() {
        let mut alloc = Allocator::new(bumpalo::Bump::new());
        alloc.set_limit(4);
        assert_eq!(alloc.alloc(0u64).unwrap_err(), AllocError);
        // Small allocations still fit
        assert!(alloc.alloc(1u8).is_ok());
    }
}
