//! Bulk construction and destruction over raw element slots.
//!
//! Every multi-element mutation in the crate decomposes into these helpers.
//! The fill helpers share one failure contract: if constructing element `i`
//! panics, elements `[0, i)` already written to the destination are dropped
//! before the panic propagates, and no slot at or beyond `i` is touched. The
//! guard lives here so no call site can forget it.

use core::{mem, ptr};

use scopeguard::ScopeGuard;

/// Drop `count` live elements starting at `ptr`.
///
/// Not even iterated when `T` has no drop glue.
///
/// # Safety
///
/// `ptr..ptr + count` must be live, properly aligned elements that are never
/// used again.
#[inline]
pub(crate) unsafe fn drop_range<T>(ptr: *mut T, count: usize) {
    if mem::needs_drop::<T>() {
        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, count));
    }
}

/// Move `count` elements from `src` to `dst` as one bulk copy.
///
/// Ownership of the values transfers to the destination; the source range is
/// logically uninitialized afterwards and must not be dropped or read again.
/// Bitwise relocation has no failure path, which is what lets growth and
/// shifting keep the old block fully intact until the operation has
/// succeeded.
///
/// # Safety
///
/// `src..src + count` must be live elements, `dst..dst + count` writable
/// slots, and the two ranges must not overlap.
#[inline]
pub(crate) unsafe fn relocate<T>(src: *const T, dst: *mut T, count: usize) {
    ptr::copy_nonoverlapping(src, dst, count);
}

/// Construct `count` clones of `value` into the slots at `dst`.
///
/// # Safety
///
/// `dst..dst + count` must be writable, properly aligned, uninitialized
/// slots.
pub(crate) unsafe fn fill_clone<T: Clone>(dst: *mut T, count: usize, value: &T) {
    let mut built = scopeguard::guard(0usize, |built| unsafe { drop_range(dst, built) });
    for i in 0..count {
        dst.add(i).write(value.clone());
        *built += 1;
    }
    ScopeGuard::into_inner(built);
}

/// Construct `count` elements into the slots at `dst` by calling `f` per
/// slot, in index order.
///
/// # Safety
///
/// Same slot requirements as [`fill_clone`].
pub(crate) unsafe fn fill_with<T, F>(dst: *mut T, count: usize, mut f: F)
where
    F: FnMut() -> T,
{
    let mut built = scopeguard::guard(0usize, |built| unsafe { drop_range(dst, built) });
    for i in 0..count {
        dst.add(i).write(f());
        *built += 1;
    }
    ScopeGuard::into_inner(built);
}

/// Construct clones of `src` into the slots at `dst`, element-wise.
///
/// # Safety
///
/// `dst..dst + src.len()` must be writable, properly aligned, uninitialized
/// slots not overlapping `src`.
pub(crate) unsafe fn clone_from_slice_uninit<T: Clone>(dst: *mut T, src: &[T]) {
    let mut built = scopeguard::guard(0usize, |built| unsafe { drop_range(dst, built) });
    for (i, value) in src.iter().enumerate() {
        dst.add(i).write(value.clone());
        *built += 1;
    }
    ScopeGuard::into_inner(built);
}
