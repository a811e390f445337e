use std::{alloc::Layout, ptr::NonNull};

/// Allocation strategy backing a storage-owning container.
///
/// A strategy hands out raw blocks described by a [`Layout`] and takes them
/// back. It may be stateless (the system heap) or carry state (an arena, a
/// pool). Containers never assume that two instances of the same strategy
/// type are interchangeable: whether a block allocated through one instance
/// may be released through another is decided by [`compatible_with`], and
/// every ownership-transfer decision (block adoption on move, O(1) swap)
/// branches on that answer.
///
/// [`compatible_with`]: Allocator::compatible_with
pub trait Allocator {
    /// `true` if any two instances of this strategy may free each other's
    /// blocks. Stateless strategies set this and get a branch-free
    /// [`compatible_with`](Allocator::compatible_with) for free.
    const ALWAYS_COMPATIBLE: bool = false;

    /// Allocate a block fitting `layout`, or `None` if the strategy cannot
    /// provide one.
    ///
    /// A returned pointer is valid for `layout.size()` bytes at
    /// `layout.align()` alignment; there is no "successful but dangling"
    /// result.
    ///
    /// # Safety
    ///
    /// `layout.size()` must be non-zero; zero-sized requests are
    /// short-circuited by the caller.
    unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Release a block previously obtained from [`alloc`](Allocator::alloc)
    /// on this instance or one compatible with it.
    ///
    /// Must not panic for blocks the strategy owns.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a live block allocated with `layout` by a
    /// compatible instance, and must not be used afterwards.
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether the allocation is owned by this strategy instance.
    ///
    /// Mainly meaningful for region-backed strategies; the system heap
    /// claims everything.
    fn owns(&self, ptr: NonNull<u8>, layout: Layout) -> bool;

    /// Whether a block allocated by `other` may be released through `self`.
    #[inline]
    fn compatible_with(&self, _other: &Self) -> bool {
        Self::ALWAYS_COMPATIBLE
    }
}
