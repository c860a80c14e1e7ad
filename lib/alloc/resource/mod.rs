//! Backing memory resources and the type-erased allocator handle.

use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};
use allocator_api2::alloc::{AllocError, Allocator, Global};

mod monotonic;
mod pool;

pub use self::monotonic::{Monotonic, DEFAULT_CHUNK_SIZE};
pub use self::pool::{PoolOptions, PoolStats, SyncPool, UnsyncPool};

static GLOBAL: Global = Global;

/// Copyable, non-owning handle to any allocator that lives for `'r`.
///
/// Feature-based allocator selection returns `AnyAlloc`, because the
/// winning allocator family is only known once the descriptor list has
/// been ranked.
#[derive(Clone, Copy)]
pub struct AnyAlloc<'r> {
    inner: &'r (dyn Allocator + 'r),
}

impl<'r> AnyAlloc<'r> {
    /// Returns a handle that allocates from `alloc`.
    #[inline]
    pub fn new<A: Allocator + 'r>(alloc: &'r A) -> AnyAlloc<'r> {
        AnyAlloc { inner: alloc }
    }

    /// Returns a handle to the global heap.
    #[inline]
    pub fn global() -> AnyAlloc<'static> {
        AnyAlloc { inner: &GLOBAL }
    }

    /// Returns `true` if both handles allocate from the same allocator.
    #[inline]
    pub fn same(&self, other: &AnyAlloc<'_>) -> bool {
        ptr::addr_eq(self.inner, other.inner)
    }
}

unsafe impl<'r> Allocator for AnyAlloc<'r> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.inner.allocate(layout)
    }

    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.inner.allocate_zeroed(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout)
    }

    #[inline]
    unsafe fn grow(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        self.inner.grow(ptr, old_layout, new_layout)
    }

    #[inline]
    unsafe fn grow_zeroed(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        self.inner.grow_zeroed(ptr, old_layout, new_layout)
    }

    #[inline]
    unsafe fn shrink(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        self.inner.shrink(ptr, old_layout, new_layout)
    }
}

impl<'r> fmt::Debug for AnyAlloc<'r> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("AnyAlloc")
            .field(&(self.inner as *const (dyn Allocator + 'r) as *const u8))
            .finish()
    }
}

/// Returns a dangling, well-aligned empty block for a zero-sized `layout`.
#[inline]
pub(crate) fn empty_block(layout: Layout) -> NonNull<[u8]> {
    // Alignment is never zero, so the pointer is never null.
    let data = unsafe { NonNull::new_unchecked(layout.align() as *mut u8) };
    NonNull::slice_from_raw_parts(data, 0)
}
