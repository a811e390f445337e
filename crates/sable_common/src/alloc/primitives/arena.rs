use std::{alloc::Layout, fmt, ptr::NonNull, sync::Arc};

use parking_lot::Mutex;

use crate::alloc::{Allocator, SystemAlloc};

/// Largest alignment the arena will serve.
const ARENA_ALIGN: usize = 16;

struct ArenaInner {
    buffer: NonNull<u8>,
    layout: Layout,
    /// Offset of the first free byte.
    head: Mutex<usize>,
}

unsafe impl Send for ArenaInner {}
unsafe impl Sync for ArenaInner {}

impl Drop for ArenaInner {
    fn drop(&mut self) {
        unsafe { SystemAlloc.dealloc(self.buffer, self.layout) };
    }
}

/// Bump arena strategy.
///
/// Hands out blocks from a single pre-allocated region, with a maximum served
/// alignment of 16 bytes. Individual deallocation is a no-op: the region is
/// released wholesale once the last handle to the arena drops.
///
/// Cloning an `ArenaAlloc` yields a handle to the *same* region, so clones
/// compare [`compatible_with`] each other and containers may trade blocks
/// between them freely. Two separately created arenas never do, which forces
/// containers onto the element-wise transfer paths.
///
/// [`compatible_with`]: Allocator::compatible_with
#[derive(Clone)]
pub struct ArenaAlloc {
    inner: Arc<ArenaInner>,
}

impl ArenaAlloc {
    /// Create an arena over `capacity` bytes of system-heap storage.
    ///
    /// # Panics
    ///
    /// Panics if the region itself cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        let layout =
            Layout::from_size_align(capacity.max(1), ARENA_ALIGN).expect("invalid arena capacity");
        let buffer =
            unsafe { SystemAlloc.alloc(layout) }.expect("failed to allocate arena region");

        Self {
            inner: Arc::new(ArenaInner {
                buffer,
                layout,
                head: Mutex::new(0),
            }),
        }
    }

    /// Bytes handed out so far, padding included.
    pub fn used(&self) -> usize {
        *self.inner.head.lock()
    }

    /// Size of the backing region in bytes.
    pub fn region_size(&self) -> usize {
        self.inner.layout.size()
    }
}

impl Allocator for ArenaAlloc {
    unsafe fn alloc(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.align() > ARENA_ALIGN {
            // Request exceeds the arena's maximum alignment.
            return None;
        }

        let mut head = self.inner.head.lock();
        let offset = (*head + layout.align() - 1) & !(layout.align() - 1);
        let end = offset.checked_add(layout.size())?;
        if end > self.inner.layout.size() {
            return None;
        }

        *head = end;
        Some(NonNull::new_unchecked(self.inner.buffer.as_ptr().add(offset)))
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        // Bump storage is reclaimed wholesale when the region drops.
        debug_assert!(self.owns(ptr, layout));
        let _ = (ptr, layout);
    }

    fn owns(&self, ptr: NonNull<u8>, _layout: Layout) -> bool {
        let start = self.inner.buffer.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr < start + self.inner.layout.size()
    }

    fn compatible_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ArenaAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAlloc")
            .field("used", &self.used())
            .field("region_size", &self.region_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::alloc::Layout;

    use crate::alloc::{Allocator, ArenaAlloc};

    #[test]
    fn alloc_dealloc() {
        let alloc = ArenaAlloc::with_capacity(256);
        let layout = Layout::new::<u64>();

        unsafe {
            let ptr = alloc.alloc(layout).unwrap();
            assert!(alloc.owns(ptr, layout));
            alloc.dealloc(ptr, layout);
        }
    }

    #[test]
    fn align_too_large() {
        let alloc = ArenaAlloc::with_capacity(256);

        let ptr = unsafe { alloc.alloc(Layout::from_size_align(8, 32).unwrap()) };
        assert!(ptr.is_none());
    }

    #[test]
    fn out_of_space() {
        let alloc = ArenaAlloc::with_capacity(64);

        let layout = Layout::from_size_align(48, 8).unwrap();
        unsafe {
            assert!(alloc.alloc(layout).is_some());
            assert!(alloc.alloc(layout).is_none());
        }
    }

    #[test]
    fn clones_share_the_region() {
        let a = ArenaAlloc::with_capacity(256);
        let b = a.clone();
        let c = ArenaAlloc::with_capacity(256);

        assert!(a.compatible_with(&b));
        assert!(!a.compatible_with(&c));

        let layout = Layout::new::<u32>();
        let ptr = unsafe { a.alloc(layout).unwrap() };
        assert!(b.owns(ptr, layout));
    }
}
