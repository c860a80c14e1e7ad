#[macro_use]
extern crate tg_alloc;

use core::alloc::Layout;
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;
use allocator_api2::alloc::{AllocError, Allocator, Global};
use allocator_api2::vec::Vec;
use tg_alloc::construct::{AllocLast, AllocString};
use tg_alloc::local::{Local, LocalStorage};
use tg_alloc::pack::Pack;
use tg_alloc::resource::AnyAlloc;
use tg_alloc::standard::StandardAndPolymorphic;

type Events = RefCell<Vec<&'static str>>;

/// Upstream allocator that records when chunks come and go.
struct Tracking {
    live: Cell<usize>,
    events: Events,
}

impl Tracking {
    fn new() -> Tracking {
        Tracking { live: Cell::new(0), events: RefCell::new(Vec::new()) }
    }
}

unsafe impl Allocator for Tracking {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let block = Global.allocate(layout)?;
        self.live.set(self.live.get() + 1);
        self.events.borrow_mut().push("acquire");
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        self.events.borrow_mut().push("release");
        Global.deallocate(ptr, layout);
    }
}

/// Object that records when it drops.
struct Sentinel<'a> {
    bytes: Vec<u8, AnyAlloc<'a>>,
    events: &'a Events,
}

impl<'a> AllocLast<AnyAlloc<'a>, (usize, &'a Events)> for Sentinel<'a> {
    fn new_alloc_last((size, events): (usize, &'a Events), alloc: AnyAlloc<'a>) -> Sentinel<'a> {
        let mut bytes = Vec::with_capacity_in(size, alloc);
        bytes.resize(size, 0);
        Sentinel { bytes, events }
    }
}

allocator_aware!(impl<'a> Sentinel<'a> { (usize, &'a Events) => AllocLast });

impl<'a> Drop for Sentinel<'a> {
    fn drop(&mut self) {
        self.events.borrow_mut().push("object");
    }
}

#[test]
fn test_local_object_drops_before_its_resource() {
    let tracking = Tracking::new();
    {
        let upstream = AnyAlloc::new(&tracking);
        local!(let sentinel: Sentinel = (upstream, (200usize, &tracking.events)) in 64);
        assert_eq!(sentinel.bytes.len(), 200);
        assert_eq!(sentinel.resource().chunk_count(), 1);
        assert_eq!(tracking.live.get(), 1);
    }
    assert_eq!(tracking.live.get(), 0);
    assert_eq!(&tracking.events.borrow()[..], ["acquire", "object", "release"]);
}

#[test]
fn test_local_allocates_from_the_buffer() {
    let tracking = Tracking::new();
    {
        let upstream = AnyAlloc::new(&tracking);
        local!(let mut numbers: Vec<u32, AnyAlloc> = (upstream, 8usize) in 256);
        numbers.extend_from_slice(&[1, 2, 3]);
        assert_eq!(numbers.resource().live(), 1);
        assert_eq!(numbers.resource().chunk_count(), 0);
        assert_eq!(numbers.resource().reserved(), 256);
    }
    assert!(tracking.events.borrow().is_empty());
}

#[test]
fn test_local_overflows_into_the_general_allocator() {
    let tracking = Tracking::new();
    {
        let upstream = AnyAlloc::new(&tracking);
        local!(let mut bytes: Vec<u8, AnyAlloc> = (upstream, 16usize) in 32);
        bytes.extend_from_slice(&[7; 100]);
        assert_eq!(bytes.len(), 100);
        assert_eq!(bytes.resource().chunk_count(), 1);
        assert_eq!(tracking.live.get(), 1);
    }
    assert_eq!(tracking.live.get(), 0);
}

#[test]
fn test_local_with_pack_context() {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let copy: Vec<u32, AnyAlloc>;
    {
        local!(let mut numbers: Vec<u32, AnyAlloc> = (pack, 4usize) in 128);
        numbers.extend_from_slice(&[1, 2, 3]);
        assert!(numbers.resource().upstream().same(&pack.general_allocator()));
        copy = numbers.promote(&pack);
    }
    assert_eq!(&copy[..], &[1, 2, 3]);
    assert!(copy.allocator().same(&pack.general_allocator()));
}

#[test]
fn test_try_promote() {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    local!(let name: AllocString<AnyAlloc> = (pack, "promoted") in 64);
    let copy: AllocString<AnyAlloc> = name.try_promote(&pack).unwrap();
    assert_eq!(copy, "promoted");
    assert!(copy.allocator().same(&AnyAlloc::global()));
    assert!(!name.allocator().same(copy.allocator()));
}

#[test]
fn test_local_resource_make() {
    let mut storage = LocalStorage::<128>::new();
    assert_eq!(storage.capacity(), 128);
    let resource = storage.bind(AnyAlloc::global());
    {
        let name: Local<AllocString<AnyAlloc>> = resource.make("local");
        let other: Local<Vec<u8, AnyAlloc>> = resource.make(16usize);
        assert_eq!(*name, "local");
        assert!(other.capacity() >= 16);
        assert_eq!(resource.resource().live(), 2);
        assert!(name.allocator().same(&resource.allocator()));
    }
    assert_eq!(resource.resource().live(), 0);
    assert_eq!(resource.resource().used(), 0);
    assert!(format!("{:?}", resource).starts_with("LocalResource { live: 0"));
}
