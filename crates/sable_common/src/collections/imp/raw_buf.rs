use core::{alloc::Layout, marker::PhantomData, mem, ptr::NonNull};

use crate::{alloc::Allocator, collections::TryReserveError, mem::init};

/// Owner of the `(pointer, capacity, allocator)` triple behind a contiguous
/// container.
///
/// `RawBuf` manages the block, never the element lifetimes: growth relocates
/// the live prefix bitwise and `Drop` only returns the block to the strategy.
/// It is up to the container to construct and destroy what is stored inside.
///
/// A dangling pointer and capacity 0 are synonymous. Zero-sized element types
/// never allocate and report a capacity of `usize::MAX`. All overflows in
/// capacity computations are promoted to
/// [`TryReserveError::CapacityOverflow`].
pub(crate) struct RawBuf<T, A: Allocator> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T, A: Allocator> RawBuf<T, A> {
    /// Tiny buffers are dumb, so skip straight to:
    /// - 8 if the element size is 1, since heap allocators round small
    ///   requests up to at least 8 bytes anyway.
    /// - 4 for moderate sizes (<= 1 KiB).
    /// - 1 otherwise, to avoid wasting space on very short runs of large
    ///   elements.
    const MIN_NON_ZERO_CAP: usize = if mem::size_of::<T>() == 1 {
        8
    } else if mem::size_of::<T>() <= 1024 {
        4
    } else {
        1
    };

    #[inline]
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Capacity of the block in elements; `usize::MAX` for zero-sized `T`.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.cap
        }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Whether `additional` more elements on top of `len` live ones would
    /// exceed the block. Kept trivially inlinable so the reserve fast path is
    /// a comparison and a never-taken call.
    #[inline]
    pub(crate) fn needs_to_grow(&self, len: usize, additional: usize) -> bool {
        additional > self.capacity().wrapping_sub(len)
    }

    /// Ensure room for `len + additional` elements, growing amortized
    /// (`max(2 * cap, required)`) and relocating the `len` live elements.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow or allocation failure.
    #[inline]
    pub(crate) fn reserve(&mut self, len: usize, additional: usize) {
        #[cold]
        fn do_reserve<T, A: Allocator>(buf: &mut RawBuf<T, A>, len: usize, additional: usize) {
            if let Err(err) = buf.grow_amortized(len, additional) {
                handle_reserve_error(err);
            }
        }

        if self.needs_to_grow(len, additional) {
            do_reserve(self, len, additional);
        }
    }

    /// Fallible twin of [`reserve`](RawBuf::reserve); the block and its
    /// contents are untouched when an error is returned.
    pub(crate) fn try_reserve(
        &mut self,
        len: usize,
        additional: usize,
    ) -> Result<(), TryReserveError> {
        if self.needs_to_grow(len, additional) {
            self.grow_amortized(len, additional)
        } else {
            Ok(())
        }
    }

    /// Ensure room for exactly `len + additional` elements, without the
    /// amortization slack.
    pub(crate) fn try_grow_exact(
        &mut self,
        len: usize,
        additional: usize,
    ) -> Result<(), TryReserveError> {
        if !self.needs_to_grow(len, additional) {
            return Ok(());
        }

        if mem::size_of::<T>() == 0 {
            // Capacity is usize::MAX for zero-sized types; getting here means
            // the buffer is overfull.
            return Err(TryReserveError::CapacityOverflow);
        }

        let required = len
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow)?;
        unsafe { self.replace_with_new_block(required, len) }
    }

    fn grow_amortized(&mut self, len: usize, additional: usize) -> Result<(), TryReserveError> {
        debug_assert!(additional > 0);

        if mem::size_of::<T>() == 0 {
            // Capacity is usize::MAX for zero-sized types; getting here means
            // the buffer is overfull.
            return Err(TryReserveError::CapacityOverflow);
        }

        let required = len
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow)?;

        // Doubling cannot overflow: cap is at most isize::MAX bytes worth of
        // elements and cap has type usize.
        let new_cap = core::cmp::max(self.cap * 2, required);
        let new_cap = core::cmp::max(Self::MIN_NON_ZERO_CAP, new_cap);

        unsafe { self.replace_with_new_block(new_cap, len) }
    }

    /// Shrink the block to `cap` slots, relocating the `len` live elements.
    /// A target of 0 deallocates outright.
    ///
    /// The old block stays in place until the replacement exists, so a failed
    /// shrink leaves the buffer untouched.
    ///
    /// # Panics
    ///
    /// Panics if `cap < len`, or on allocation failure.
    pub(crate) fn shrink_to(&mut self, len: usize, cap: usize) {
        assert!(cap >= len, "tried to shrink below the live length");

        if mem::size_of::<T>() == 0 || cap >= self.cap {
            return;
        }

        if cap == 0 {
            unsafe {
                self.dealloc_block(self.ptr, self.cap);
            }
            self.ptr = NonNull::dangling();
            self.cap = 0;
        } else if let Err(err) = unsafe { self.replace_with_new_block(cap, len) } {
            handle_reserve_error(err);
        }
    }

    /// Allocate a block of `cap` slots through this buffer's strategy without
    /// installing it. Zero-sized requests resolve to a dangling pointer.
    pub(crate) fn alloc_block(&self, cap: usize) -> Result<NonNull<T>, TryReserveError> {
        if mem::size_of::<T>() == 0 || cap == 0 {
            return Ok(NonNull::dangling());
        }

        let layout = Layout::array::<T>(cap).map_err(|_| TryReserveError::CapacityOverflow)?;
        match unsafe { self.alloc.alloc(layout) } {
            Some(ptr) => Ok(ptr.cast()),
            None => Err(TryReserveError::AllocFailed(layout)),
        }
    }

    /// Release a block of `cap` slots through this buffer's strategy.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a live block of `cap` slots allocated by a strategy
    /// compatible with this buffer's; no element may still be live inside.
    pub(crate) unsafe fn dealloc_block(&self, ptr: NonNull<T>, cap: usize) {
        if mem::size_of::<T>() == 0 || cap == 0 {
            return;
        }

        // The layout was validated on allocation; recompute it without the
        // failure path so deallocation cannot panic.
        let layout = Layout::from_size_align_unchecked(
            mem::size_of::<T>().wrapping_mul(cap),
            mem::align_of::<T>(),
        );
        self.alloc.dealloc(ptr.cast(), layout);
    }

    /// Install `ptr` as the new block, releasing the current one.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`alloc_block`](RawBuf::alloc_block) on this
    /// buffer (or a compatible strategy) with capacity `cap`, and every
    /// element of the current block must have been relocated out or dropped.
    pub(crate) unsafe fn install_block(&mut self, ptr: NonNull<T>, cap: usize) {
        self.dealloc_block(self.ptr, self.cap);
        self.ptr = ptr;
        self.cap = cap;
    }

    /// Take over `other`'s block. `self` must not own one yet; `other` is
    /// left empty.
    pub(crate) fn adopt_from(&mut self, other: &mut Self) {
        debug_assert!(self.cap == 0, "adopting into a buffer that owns a block");

        self.ptr = mem::replace(&mut other.ptr, NonNull::dangling());
        self.cap = mem::replace(&mut other.cap, 0);
    }

    unsafe fn replace_with_new_block(
        &mut self,
        new_cap: usize,
        len: usize,
    ) -> Result<(), TryReserveError> {
        let new_ptr = self.alloc_block(new_cap)?;
        init::relocate(self.ptr.as_ptr(), new_ptr.as_ptr(), len);
        self.install_block(new_ptr, new_cap);
        Ok(())
    }
}

impl<T, A: Allocator> Drop for RawBuf<T, A> {
    fn drop(&mut self) {
        unsafe { self.dealloc_block(self.ptr, self.cap) };
    }
}

/// Central funnel for reservation failures on the infallible paths.
#[cold]
pub(crate) fn handle_reserve_error(err: TryReserveError) -> ! {
    match err {
        TryReserveError::CapacityOverflow => panic!("capacity overflow"),
        TryReserveError::AllocFailed(layout) => {
            panic!("allocation of {} bytes failed", layout.size())
        }
    }
}
