use core::alloc::Layout;
use core::cell::RefCell;
use core::cmp;
use core::fmt;
use core::ptr::{self, NonNull};
use allocator_api2::alloc::{AllocError, Allocator, Global};
use log::{trace, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use crate::descriptor::Storage;
use crate::pack::PackConfig;

/// Base-2 logarithm of the smallest pool block size.
const MIN_BLOCK_SHIFT: u32 = 4;

/// Tuning of pooled resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Upper bound on the number of blocks acquired at once for one size class.
    pub max_blocks_per_chunk: usize,
    /// Largest block served from a pool; larger requests go straight upstream.
    pub largest_required_pool_block: usize,
}

impl Default for PoolOptions {
    fn default() -> PoolOptions {
        PoolOptions {
            max_blocks_per_chunk: 128,
            largest_required_pool_block: 4096,
        }
    }
}

/// Allocation statistics of a pooled resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of live allocations.
    pub live: usize,
    /// Number of bytes in live allocations, rounded up to block sizes.
    pub used: usize,
    /// Number of bytes held in pool chunks.
    pub reserved: usize,
    /// Number of pool chunks acquired from upstream.
    pub chunks: usize,
}

/// Free block, linked into the free list of its size class.
struct FreeBlock {
    next: Option<NonNull<FreeBlock>>,
}

/// Power-of-two size class of a pool.
struct SizeClass {
    block_size: usize,
    /// First free block of this size class.
    head: Option<NonNull<FreeBlock>>,
    /// Number of blocks to acquire on the next refill.
    blocks_per_chunk: usize,
}

/// Unsynchronized pool state shared by the pooled resources.
struct PoolCore<U: Allocator> {
    classes: Vec<SizeClass>,
    /// Every chunk acquired from upstream, with its layout.
    chunks: Vec<(NonNull<u8>, Layout)>,
    options: PoolOptions,
    upstream: U,
    stats: PoolStats,
}

unsafe impl<U: Allocator + Send> Send for PoolCore<U> {}

impl<U: Allocator> PoolCore<U> {
    fn new(options: PoolOptions, upstream: U) -> PoolCore<U> {
        let largest = cmp::max(options.largest_required_pool_block, 1 << MIN_BLOCK_SHIFT)
            .checked_next_power_of_two()
            .unwrap_or(1 << (usize::BITS - 1));
        let count = largest.trailing_zeros() - MIN_BLOCK_SHIFT + 1;
        let classes = (0..count)
            .map(|index| SizeClass {
                block_size: 1 << (MIN_BLOCK_SHIFT + index),
                head: None,
                blocks_per_chunk: 1,
            })
            .collect();
        PoolCore {
            classes,
            chunks: Vec::new(),
            options,
            upstream,
            stats: PoolStats::default(),
        }
    }

    /// Returns the size class that serves `layout`, or `None` if `layout`
    /// must be served upstream.
    fn class_of(&self, layout: Layout) -> Option<usize> {
        let size = cmp::max(cmp::max(layout.size(), layout.align()), 1 << MIN_BLOCK_SHIFT);
        let block_size = size.checked_next_power_of_two()?;
        let index = (block_size.trailing_zeros() - MIN_BLOCK_SHIFT) as usize;
        if index < self.classes.len() { Some(index) } else { None }
    }

    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let index = match self.class_of(layout) {
            Some(index) => index,
            None => {
                let block = self.upstream.allocate(layout)?;
                self.stats.live += 1;
                self.stats.used += layout.size();
                return Ok(block);
            }
        };
        if self.classes[index].head.is_none() {
            self.refill(index)?;
        }
        let class = &mut self.classes[index];
        let block = class.head.ok_or(AllocError)?;
        // Pop the block off the free list.
        class.head = unsafe { (*block.as_ptr()).next };
        self.stats.live += 1;
        self.stats.used += class.block_size;
        Ok(NonNull::slice_from_raw_parts(block.cast::<u8>(), class.block_size))
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.live -= 1;
        match self.class_of(layout) {
            Some(index) => {
                let class = &mut self.classes[index];
                // Push the block onto the free list.
                let block = ptr.cast::<FreeBlock>();
                ptr::write(block.as_ptr(), FreeBlock { next: class.head });
                class.head = Some(block);
                self.stats.used -= class.block_size;
            }
            None => {
                self.upstream.deallocate(ptr, layout);
                self.stats.used = self.stats.used.saturating_sub(layout.size());
            }
        }
    }

    /// Acquires a chunk of blocks for size class `index` and threads them
    /// onto its free list.
    fn refill(&mut self, index: usize) -> Result<(), AllocError> {
        let max_blocks = cmp::max(self.options.max_blocks_per_chunk, 1);
        let class = &mut self.classes[index];
        let block_size = class.block_size;
        let count = cmp::min(class.blocks_per_chunk, max_blocks);
        let chunk_size = block_size.checked_mul(count).ok_or(AllocError)?;
        let layout = Layout::from_size_align(chunk_size, block_size).map_err(|_| AllocError)?;
        let chunk = self.upstream.allocate(layout)?.cast::<u8>();
        // Thread the blocks back to front, so that they pop in address order.
        let mut head = class.head;
        for block_index in (0..count).rev() {
            unsafe {
                let block = chunk.as_ptr().add(block_index * block_size).cast::<FreeBlock>();
                ptr::write(block, FreeBlock { next: head });
                head = Some(NonNull::new_unchecked(block));
            }
        }
        class.head = head;
        class.blocks_per_chunk = cmp::min(count.saturating_mul(2), max_blocks);
        self.chunks.push((chunk, layout));
        self.stats.reserved += chunk_size;
        self.stats.chunks += 1;
        trace!("pool acquired {} blocks of {} bytes", count, block_size);
        Ok(())
    }

    /// Returns every chunk to upstream.
    fn release(&mut self) {
        if self.stats.live != 0 {
            warn!("pool released with {} live allocations", self.stats.live);
        }
        for (chunk, layout) in self.chunks.drain(..) {
            unsafe { self.upstream.deallocate(chunk, layout) };
        }
        for class in self.classes.iter_mut() {
            class.head = None;
            class.blocks_per_chunk = 1;
        }
        self.stats = PoolStats::default();
    }
}

impl<U: Allocator> Drop for PoolCore<U> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Thread-safe pooled resource with power-of-two size classes.
pub struct SyncPool<U: Allocator = Global> {
    core: Mutex<PoolCore<U>>,
}

impl SyncPool<Global> {
    #[inline]
    pub fn new(options: PoolOptions) -> SyncPool<Global> {
        SyncPool::with_upstream(options, Global)
    }
}

impl<U: Allocator> SyncPool<U> {
    pub fn with_upstream(options: PoolOptions, upstream: U) -> SyncPool<U> {
        SyncPool { core: Mutex::new(PoolCore::new(options, upstream)) }
    }

    #[inline]
    pub fn options(&self) -> PoolOptions {
        self.core.lock().options
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.core.lock().stats
    }

    /// Returns every chunk to upstream.
    #[inline]
    pub fn release(&mut self) {
        self.core.get_mut().release();
    }
}

unsafe impl<U: Allocator> Allocator for SyncPool<U> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.core.lock().allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.core.lock().deallocate(ptr, layout)
    }
}

impl<U: Allocator> fmt::Debug for SyncPool<U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("SyncPool")
            .field("options", &core.options)
            .field("stats", &core.stats)
            .finish()
    }
}

impl Storage for SyncPool<Global> {
    fn try_default(config: &PackConfig) -> Option<SyncPool<Global>> {
        Some(SyncPool::new(config.pool))
    }
}

/// Single-threaded pooled resource with power-of-two size classes.
pub struct UnsyncPool<U: Allocator = Global> {
    core: RefCell<PoolCore<U>>,
}

impl UnsyncPool<Global> {
    #[inline]
    pub fn new(options: PoolOptions) -> UnsyncPool<Global> {
        UnsyncPool::with_upstream(options, Global)
    }
}

impl<U: Allocator> UnsyncPool<U> {
    pub fn with_upstream(options: PoolOptions, upstream: U) -> UnsyncPool<U> {
        UnsyncPool { core: RefCell::new(PoolCore::new(options, upstream)) }
    }

    #[inline]
    pub fn options(&self) -> PoolOptions {
        self.core.borrow().options
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.core.borrow().stats
    }

    /// Returns every chunk to upstream.
    #[inline]
    pub fn release(&mut self) {
        self.core.get_mut().release();
    }
}

unsafe impl<U: Allocator> Allocator for UnsyncPool<U> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.core.borrow_mut().allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.core.borrow_mut().deallocate(ptr, layout)
    }
}

impl<U: Allocator> fmt::Debug for UnsyncPool<U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.core.try_borrow() {
            Ok(core) => f.debug_struct("UnsyncPool")
                .field("options", &core.options)
                .field("stats", &core.stats)
                .finish(),
            Err(_) => f.write_str("UnsyncPool { <borrowed> }"),
        }
    }
}

impl Storage for UnsyncPool<Global> {
    fn try_default(config: &PackConfig) -> Option<UnsyncPool<Global>> {
        Some(UnsyncPool::new(config.pool))
    }
}
