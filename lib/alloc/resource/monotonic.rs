use core::alloc::Layout;
use core::cell::Cell;
use core::cmp;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};
use allocator_api2::alloc::{AllocError, Allocator};
use log::{trace, warn};
use crate::descriptor::Storage;
use crate::pack::PackConfig;
use crate::resource::{AnyAlloc, empty_block};

/// Size of the first upstream chunk when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Linear allocator that bump-allocates from an optional caller buffer, then
/// from a growing list of chunks acquired from an upstream allocator.
///
/// A monotonic resource only reclaims space when the most recent allocation
/// drops, and when the whole resource is released or dropped. Each upstream
/// chunk is twice the size of the previous one. Not thread-safe.
pub struct Monotonic<'b> {
    /// Base address of the current chunk.
    base: Cell<NonNull<u8>>,
    /// Number of bytes in the current chunk.
    size: Cell<usize>,
    /// Offset from the base address of the next free byte in the current chunk.
    mark: Cell<usize>,
    /// Most recently acquired upstream chunk.
    head: Cell<Option<NonNull<ChunkHeader>>>,
    /// Size of the next upstream chunk.
    next_size: Cell<usize>,
    /// Caller buffer to restart from on release.
    buffer: Option<(NonNull<u8>, usize)>,
    /// Size of the first upstream chunk after a release.
    chunk_size: usize,
    /// Allocator that supplies chunks once the current chunk is exhausted.
    upstream: AnyAlloc<'b>,
    /// Number of bytes reserved, including the caller buffer.
    reserved: Cell<usize>,
    /// Number of live allocations.
    live: Cell<usize>,
    /// Number of currently allocated bytes.
    used: Cell<usize>,
    /// Variant over the borrowed buffer.
    marker: PhantomData<&'b mut [u8]>,
}

/// Header at the start of every upstream chunk.
struct ChunkHeader {
    /// Previously acquired chunk.
    prev: Option<NonNull<ChunkHeader>>,
    /// Layout the chunk was acquired with.
    layout: Layout,
}

impl<'b> Monotonic<'b> {
    /// Returns a new `Monotonic` resource that acquires all memory from `upstream`.
    #[inline]
    pub fn new(upstream: AnyAlloc<'b>) -> Monotonic<'b> {
        Monotonic::with_chunk_size(upstream, DEFAULT_CHUNK_SIZE)
    }

    /// Returns a new `Monotonic` resource whose first upstream chunk holds
    /// at least `chunk_size` bytes.
    pub fn with_chunk_size(upstream: AnyAlloc<'b>, chunk_size: usize) -> Monotonic<'b> {
        let chunk_size = cmp::max(chunk_size, mem::size_of::<ChunkHeader>() * 2);
        Monotonic {
            base: Cell::new(NonNull::dangling()),
            size: Cell::new(0),
            mark: Cell::new(0),
            head: Cell::new(None),
            next_size: Cell::new(chunk_size),
            buffer: None,
            chunk_size,
            upstream,
            reserved: Cell::new(0),
            live: Cell::new(0),
            used: Cell::new(0),
            marker: PhantomData,
        }
    }

    /// Returns a new `Monotonic` resource that allocates from `buffer` until
    /// it is exhausted, and from `upstream` afterwards.
    pub fn with_buffer(buffer: &'b mut [MaybeUninit<u8>], upstream: AnyAlloc<'b>) -> Monotonic<'b> {
        let size = buffer.len();
        let base = NonNull::from(buffer).cast::<u8>();
        let mut resource = Monotonic::with_chunk_size(upstream, size.saturating_mul(2));
        resource.base.set(base);
        resource.size.set(size);
        resource.buffer = Some((base, size));
        resource.reserved.set(size);
        resource
    }

    /// Returns the allocator that supplies chunks to this resource.
    #[inline]
    pub fn upstream(&self) -> AnyAlloc<'b> {
        self.upstream
    }

    /// Returns the number of bytes reserved by this resource, including
    /// any caller buffer.
    #[inline]
    pub fn reserved(&self) -> usize {
        self.reserved.get()
    }

    /// Returns the number of free bytes left in the current chunk.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.size.get().wrapping_sub(self.mark.get())
    }

    /// Returns the number of live allocations in this resource.
    #[inline]
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Returns the number of bytes currently allocated in this resource.
    #[inline]
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Returns the number of chunks acquired from upstream.
    pub fn chunk_count(&self) -> usize {
        let mut count = 0;
        let mut next = self.head.get();
        while let Some(chunk) = next {
            count += 1;
            next = unsafe { (*chunk.as_ptr()).prev };
        }
        count
    }

    /// Returns every upstream chunk and restarts from the caller buffer.
    pub fn release(&mut self) {
        if self.live.get() != 0 {
            warn!("monotonic resource released with {} live allocations", self.live.get());
        }
        // Pop the chunk list, returning each chunk to upstream.
        let mut next = self.head.take();
        while let Some(chunk) = next {
            unsafe {
                let header = ptr::read(chunk.as_ptr());
                next = header.prev;
                self.upstream.deallocate(chunk.cast::<u8>(), header.layout);
            }
        }
        // Restart from the caller buffer, if any.
        match self.buffer {
            Some((base, size)) => {
                self.base.set(base);
                self.size.set(size);
                self.reserved.set(size);
            }
            None => {
                self.base.set(NonNull::dangling());
                self.size.set(0);
                self.reserved.set(0);
            }
        }
        self.mark.set(0);
        self.next_size.set(self.chunk_size);
        self.live.set(0);
        self.used.set(0);
    }

    /// Advances the mark past a block sized and aligned to `layout`;
    /// returns `None` if the block does not fit in the current chunk.
    fn bump(&self, layout: Layout) -> Option<NonNull<u8>> {
        // Get the base address of the current chunk.
        let base = self.base.get();
        let base_addr = base.as_ptr() as usize;
        // Compute the address of the next free byte.
        let start_addr = base_addr.checked_add(self.mark.get())?;
        // Round up to the alignment required by the block.
        let align_mask = layout.align().wrapping_sub(1);
        let block_addr = start_addr.checked_add(align_mask)? & !align_mask;
        // Compute the end address of the block; bail on overflow.
        let end_addr = block_addr.checked_add(layout.size())?;
        // Compute the new mark offset by subtracting the base address.
        let new_mark = end_addr.wrapping_sub(base_addr);
        // Bail if the block would overflow the current chunk.
        if new_mark > self.size.get() {
            return None;
        }
        self.mark.set(new_mark);
        // Derive the block pointer from the chunk base pointer.
        Some(unsafe { NonNull::new_unchecked(base.as_ptr().add(block_addr - base_addr)) })
    }

    /// Acquires a new current chunk from upstream large enough for `layout`.
    fn push_chunk(&self, layout: Layout) -> Result<(), AllocError> {
        let header = Layout::new::<ChunkHeader>();
        // Make room for the chunk header and worst case alignment padding.
        let needed = header.size()
            .checked_add(layout.size())
            .and_then(|size| size.checked_add(layout.align()))
            .ok_or(AllocError)?;
        let size = cmp::max(self.next_size.get(), needed);
        let align = cmp::max(header.align(), layout.align());
        let chunk_layout = Layout::from_size_align(size, align).map_err(|_| AllocError)?;
        // Acquire the chunk, bailing on failure.
        let chunk = self.upstream.allocate(chunk_layout)?;
        let chunk_size = chunk.len();
        let chunk = chunk.cast::<u8>();
        // Link the chunk into the chunk list.
        let header_ptr = chunk.cast::<ChunkHeader>();
        unsafe {
            ptr::write(header_ptr.as_ptr(), ChunkHeader {
                prev: self.head.get(),
                layout: chunk_layout,
            });
        }
        self.head.set(Some(header_ptr));
        // Make the new chunk current, just past its header.
        self.base.set(chunk);
        self.size.set(chunk_size);
        self.mark.set(header.size());
        self.reserved.set(self.reserved.get() + chunk_size);
        self.next_size.set(size.saturating_mul(2));
        trace!("monotonic resource acquired a {} byte chunk", chunk_size);
        Ok(())
    }

    /// Resizes `ptr` in place if it is the most recent allocation in the
    /// current chunk, and the new layout fits.
    fn resize_in_place(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Option<NonNull<[u8]>>
    {
        if old_layout.size() == 0 || new_layout.size() == 0 {
            return None;
        }
        let block_addr = ptr.as_ptr() as usize;
        // Check if the current block is suitably aligned for the new layout.
        if block_addr % new_layout.align() != 0 {
            return None;
        }
        let base_addr = self.base.get().as_ptr() as usize;
        if block_addr < base_addr {
            return None;
        }
        // Only the block ending at the mark can change size.
        let old_mark = block_addr.wrapping_add(old_layout.size()).wrapping_sub(base_addr);
        if old_mark != self.mark.get() {
            return None;
        }
        let new_mark = block_addr.checked_add(new_layout.size())?.wrapping_sub(base_addr);
        if new_mark > self.size.get() {
            return None;
        }
        self.mark.set(new_mark);
        self.used.set(self.used.get() - old_layout.size() + new_layout.size());
        Some(NonNull::slice_from_raw_parts(ptr, new_layout.size()))
    }
}

unsafe impl<'b> Allocator for Monotonic<'b> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        // Check if the layout represents a zero-sized type.
        if layout.size() == 0 {
            self.live.set(self.live.get() + 1);
            return Ok(empty_block(layout));
        }
        // Try the current chunk, then a fresh chunk.
        let block = match self.bump(layout) {
            Some(block) => block,
            None => {
                self.push_chunk(layout)?;
                self.bump(layout).ok_or(AllocError)?
            }
        };
        self.live.set(self.live.get() + 1);
        self.used.set(self.used.get() + layout.size());
        Ok(NonNull::slice_from_raw_parts(block, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        if layout.size() == 0 {
            return;
        }
        self.used.set(self.used.get() - layout.size());
        let base_addr = self.base.get().as_ptr() as usize;
        let block_addr = ptr.as_ptr() as usize;
        // Rewind the mark if it still points to the end of the block,
        // i.e. pop the stack, if we can.
        if block_addr >= base_addr
            && block_addr.wrapping_add(layout.size()).wrapping_sub(base_addr) == self.mark.get()
        {
            self.mark.set(block_addr - base_addr);
        }
    }

    unsafe fn grow(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        if let Some(block) = self.resize_in_place(ptr, old_layout, new_layout) {
            return Ok(block);
        }
        let new_block = self.allocate(new_layout)?;
        ptr::copy_nonoverlapping(ptr.as_ptr(), new_block.cast::<u8>().as_ptr(), old_layout.size());
        self.deallocate(ptr, old_layout);
        Ok(new_block)
    }

    unsafe fn shrink(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        if let Some(block) = self.resize_in_place(ptr, old_layout, new_layout) {
            return Ok(block);
        }
        // A shrunken block stays put if it is already suitably aligned.
        if ptr.as_ptr() as usize % new_layout.align() == 0 {
            self.used.set(self.used.get() - (old_layout.size() - new_layout.size()));
            return Ok(NonNull::slice_from_raw_parts(ptr, new_layout.size()));
        }
        let new_block = self.allocate(new_layout)?;
        ptr::copy_nonoverlapping(ptr.as_ptr(), new_block.cast::<u8>().as_ptr(), new_layout.size());
        self.deallocate(ptr, old_layout);
        Ok(new_block)
    }
}

impl<'b> Drop for Monotonic<'b> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<'b> fmt::Debug for Monotonic<'b> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Monotonic")
            .field("live", &self.live())
            .field("used", &self.used())
            .field("reserved", &self.reserved())
            .field("chunks", &self.chunk_count())
            .finish()
    }
}

impl Storage for Monotonic<'static> {
    fn try_default(config: &PackConfig) -> Option<Monotonic<'static>> {
        Some(Monotonic::with_chunk_size(AnyAlloc::global(), config.monotonic_chunk_size))
    }
}
