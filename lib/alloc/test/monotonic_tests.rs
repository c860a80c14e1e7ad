extern crate tg_alloc;

use core::alloc::Layout;
use core::cell::Cell;
use core::mem::MaybeUninit;
use core::ptr::NonNull;
use allocator_api2::alloc::{AllocError, Allocator, Global};
use allocator_api2::vec::Vec;
use tg_alloc::resource::{AnyAlloc, Monotonic};

/// Upstream allocator that counts the chunks it hands out.
struct Tracking {
    live: Cell<usize>,
    reserved: Cell<usize>,
}

impl Tracking {
    fn new() -> Tracking {
        Tracking { live: Cell::new(0), reserved: Cell::new(0) }
    }
}

unsafe impl Allocator for Tracking {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let block = Global.allocate(layout)?;
        self.live.set(self.live.get() + 1);
        self.reserved.set(self.reserved.get() + layout.size());
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        self.reserved.set(self.reserved.get() - layout.size());
        Global.deallocate(ptr, layout);
    }
}

/// Upstream allocator with no memory.
struct Exhausted;

unsafe impl Allocator for Exhausted {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        Err(AllocError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        unreachable!();
    }
}

fn bytes(size: usize) -> Layout {
    Layout::from_size_align(size, 1).unwrap()
}

#[test]
fn test_monotonic_alloc_from_buffer() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 256];
    let upstream = Exhausted;
    let monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::new(&upstream));
    assert_eq!(monotonic.reserved(), 256);
    assert_eq!(monotonic.remaining(), 256);

    let a = monotonic.allocate(bytes(16)).unwrap();
    let b = monotonic.allocate(bytes(32)).unwrap();
    assert_eq!(a.len(), 16);
    assert_eq!(b.len(), 32);
    assert_eq!(monotonic.live(), 2);
    assert_eq!(monotonic.used(), 48);
    assert_eq!(monotonic.remaining(), 208);
    assert_eq!(monotonic.chunk_count(), 0);
    unsafe {
        monotonic.deallocate(b.cast(), bytes(32));
        monotonic.deallocate(a.cast(), bytes(16));
    }
    assert_eq!(monotonic.live(), 0);
    assert_eq!(monotonic.used(), 0);
}

#[test]
fn test_monotonic_reclaims_most_recent_block() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 256];
    let monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::global());
    let a = monotonic.allocate(bytes(16)).unwrap();
    let b = monotonic.allocate(bytes(16)).unwrap();
    assert_eq!(monotonic.remaining(), 224);
    unsafe { monotonic.deallocate(b.cast(), bytes(16)) };
    assert_eq!(monotonic.remaining(), 240);
    unsafe { monotonic.deallocate(a.cast(), bytes(16)) };
    assert_eq!(monotonic.remaining(), 256);
}

#[test]
fn test_monotonic_does_not_reclaim_older_blocks() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 256];
    let monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::global());
    let a = monotonic.allocate(bytes(16)).unwrap();
    let b = monotonic.allocate(bytes(16)).unwrap();
    unsafe { monotonic.deallocate(a.cast(), bytes(16)) };
    assert_eq!(monotonic.remaining(), 224);
    assert_eq!(monotonic.live(), 1);
    unsafe { monotonic.deallocate(b.cast(), bytes(16)) };
    assert_eq!(monotonic.remaining(), 240);
}

#[test]
fn test_monotonic_grows_in_place() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 256];
    let monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::global());
    let mut vec: Vec<u8, &Monotonic> = Vec::with_capacity_in(8, &monotonic);
    vec.extend_from_slice(b"grow");
    let ptr = vec.as_ptr();
    vec.reserve_exact(60);
    assert_eq!(vec.as_ptr(), ptr);
    assert!(vec.capacity() >= 64);
    assert_eq!(&vec[..], b"grow");
    assert_eq!(monotonic.live(), 1);
    assert_eq!(monotonic.remaining(), 256 - vec.capacity());
}

#[test]
fn test_monotonic_shrinks_in_place() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 256];
    let monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::global());
    let mut vec: Vec<u8, &Monotonic> = Vec::with_capacity_in(64, &monotonic);
    vec.extend_from_slice(b"shrink");
    let ptr = vec.as_ptr();
    vec.shrink_to_fit();
    assert_eq!(vec.as_ptr(), ptr);
    assert_eq!(monotonic.used(), 6);
    assert_eq!(monotonic.remaining(), 250);
}

#[test]
fn test_monotonic_overflows_upstream() {
    let upstream = Tracking::new();
    let mut buffer = [MaybeUninit::<u8>::uninit(); 64];
    {
        let monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::new(&upstream));
        let a = monotonic.allocate(bytes(48)).unwrap();
        assert_eq!(upstream.live.get(), 0);
        let b = monotonic.allocate(bytes(48)).unwrap();
        assert_eq!(upstream.live.get(), 1);
        assert_eq!(monotonic.chunk_count(), 1);
        assert_eq!(monotonic.reserved(), 64 + upstream.reserved.get());
        unsafe {
            monotonic.deallocate(b.cast(), bytes(48));
            monotonic.deallocate(a.cast(), bytes(48));
        }
        // Chunks are only returned when the resource is released.
        assert_eq!(upstream.live.get(), 1);
    }
    assert_eq!(upstream.live.get(), 0);
    assert_eq!(upstream.reserved.get(), 0);
}

#[test]
fn test_monotonic_chunks_grow_geometrically() {
    let upstream = Tracking::new();
    let monotonic = Monotonic::with_chunk_size(AnyAlloc::new(&upstream), 128);
    let _a = monotonic.allocate(bytes(64)).unwrap();
    assert_eq!(upstream.reserved.get(), 128);
    let _b = monotonic.allocate(bytes(64)).unwrap();
    assert_eq!(upstream.reserved.get(), 128 + 256);
    let _c = monotonic.allocate(bytes(64)).unwrap();
    assert_eq!(upstream.reserved.get(), 128 + 256);
    assert_eq!(monotonic.chunk_count(), 2);
}

#[test]
fn test_monotonic_oversized_request() {
    let upstream = Tracking::new();
    let monotonic = Monotonic::with_chunk_size(AnyAlloc::new(&upstream), 128);
    let block = monotonic.allocate(bytes(1000)).unwrap();
    assert_eq!(block.len(), 1000);
    assert!(upstream.reserved.get() > 1000);
    assert_eq!(monotonic.chunk_count(), 1);
}

#[test]
fn test_monotonic_aligns_blocks() {
    let monotonic = Monotonic::new(AnyAlloc::global());
    let _byte = monotonic.allocate(bytes(1)).unwrap();
    let layout = Layout::from_size_align(8, 64).unwrap();
    let block = monotonic.allocate(layout).unwrap();
    assert_eq!(block.cast::<u8>().as_ptr() as usize % 64, 0);
}

#[test]
fn test_monotonic_zero_sized_alloc() {
    let monotonic = Monotonic::new(AnyAlloc::new(&Exhausted));
    let layout = Layout::new::<()>();
    let block = monotonic.allocate(layout).unwrap();
    assert_eq!(block.len(), 0);
    assert_eq!(monotonic.live(), 1);
    unsafe { monotonic.deallocate(block.cast(), layout) };
    assert_eq!(monotonic.live(), 0);
}

#[test]
fn test_monotonic_upstream_exhaustion() {
    let upstream = Exhausted;
    let monotonic = Monotonic::new(AnyAlloc::new(&upstream));
    assert_eq!(monotonic.allocate(bytes(8)), Err(AllocError));
    assert_eq!(monotonic.live(), 0);
}

#[test]
fn test_monotonic_release() {
    let upstream = Tracking::new();
    let mut buffer = [MaybeUninit::<u8>::uninit(); 32];
    let mut monotonic = Monotonic::with_buffer(&mut buffer, AnyAlloc::new(&upstream));
    let a = monotonic.allocate(bytes(64)).unwrap();
    unsafe { monotonic.deallocate(a.cast(), bytes(64)) };
    assert_eq!(upstream.live.get(), 1);
    monotonic.release();
    assert_eq!(upstream.live.get(), 0);
    assert_eq!(monotonic.chunk_count(), 0);
    assert_eq!(monotonic.reserved(), 32);
    assert_eq!(monotonic.remaining(), 32);
}
