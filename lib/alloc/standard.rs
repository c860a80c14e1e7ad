//! Stock allocator families and descriptor lists.
//!
//! - `Standard`: the global heap, through the stateless `Global` handle.
//! - `Polymorphic`: a `Poly` handle bound to any of the reference resources
//!   at run time.

use core::alloc::Layout;
use core::ptr::NonNull;
use allocator_api2::alloc::{AllocError, Allocator, Global};
use crate::descriptor::{AllocatorDescriptor, Described, ResourceDescriptor, Stateless};
use crate::descriptors;
use crate::feature::{Feature, FeaturePack};
use crate::resource::{AnyAlloc, Monotonic, SyncPool, UnsyncPool};

/// Allocator family of the global heap.
#[derive(Clone, Copy, Debug, Default)]
pub struct Standard;

/// Allocator family of polymorphic handles to the reference resources.
#[derive(Clone, Copy, Debug, Default)]
pub struct Polymorphic;

/// The global heap; needs no storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHeap;

/// A pack-owned `Monotonic` resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicResource;

/// A pack-owned `SyncPool` resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncPoolResource;

/// A pack-owned `UnsyncPool` resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsyncPoolResource;

/// Descriptor list with only the `Standard` family.
pub type StandardOnly = descriptors![Standard];

/// Descriptor list with the `Standard` family, then the `Polymorphic` family.
pub type StandardAndPolymorphic = descriptors![Standard, Polymorphic];

impl AllocatorDescriptor for Standard {
    type Alloc<'r> = Global;
    type Resources = descriptors![DefaultHeap];
    type DefaultResource = DefaultHeap;

    const NAME: &'static str = "standard";

    const FEATURES: FeaturePack = FeaturePack::of(&[
        Feature::Stateless,
        Feature::Sync,
        Feature::LowLocality,
    ]);

    #[inline]
    fn erase<'r>(_alloc: Self::Alloc<'r>) -> AnyAlloc<'r> {
        AnyAlloc::global()
    }
}

impl ResourceDescriptor<Standard> for DefaultHeap {
    type Storage = Stateless;

    const NAME: &'static str = "default_heap";

    const FEATURES: FeaturePack = FeaturePack::EMPTY;

    #[inline]
    fn construct_allocator<'r>(_storage: &'r Stateless) -> Global {
        Global
    }
}

impl Described for Global {
    type Descriptor = Standard;
}

/// Allocator handle that forwards to a resource chosen at run time.
#[derive(Clone, Copy, Debug)]
pub struct Poly<'r> {
    resource: AnyAlloc<'r>,
}

impl<'r> Poly<'r> {
    #[inline]
    pub fn new(resource: AnyAlloc<'r>) -> Poly<'r> {
        Poly { resource }
    }

    /// Returns the resource this handle allocates from.
    #[inline]
    pub fn resource(&self) -> AnyAlloc<'r> {
        self.resource
    }
}

impl<'r> PartialEq for Poly<'r> {
    #[inline]
    fn eq(&self, other: &Poly<'r>) -> bool {
        self.resource.same(&other.resource)
    }
}

unsafe impl<'r> Allocator for Poly<'r> {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.resource.allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.resource.deallocate(ptr, layout)
    }

    #[inline]
    unsafe fn grow(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        self.resource.grow(ptr, old_layout, new_layout)
    }

    #[inline]
    unsafe fn shrink(&self, ptr: NonNull<u8>, old_layout: Layout, new_layout: Layout)
        -> Result<NonNull<[u8]>, AllocError>
    {
        self.resource.shrink(ptr, old_layout, new_layout)
    }
}

impl<'r> Described for Poly<'r> {
    type Descriptor = Polymorphic;
}

impl AllocatorDescriptor for Polymorphic {
    type Alloc<'r> = Poly<'r>;
    type Resources = descriptors![DefaultHeap, MonotonicResource, SyncPoolResource, UnsyncPoolResource];
    type DefaultResource = DefaultHeap;

    const NAME: &'static str = "polymorphic";

    const FEATURES: FeaturePack = FeaturePack::of(&[Feature::Stateful]);

    #[inline]
    fn erase<'r>(alloc: Self::Alloc<'r>) -> AnyAlloc<'r> {
        alloc.resource()
    }
}

impl ResourceDescriptor<Polymorphic> for DefaultHeap {
    type Storage = Stateless;

    const NAME: &'static str = "default_heap";

    const FEATURES: FeaturePack = FeaturePack::EMPTY;

    #[inline]
    fn construct_allocator<'r>(_storage: &'r Stateless) -> Poly<'r> {
        Poly::new(AnyAlloc::global())
    }
}

impl ResourceDescriptor<Polymorphic> for MonotonicResource {
    type Storage = Monotonic<'static>;

    const NAME: &'static str = "monotonic";

    const FEATURES: FeaturePack = FeaturePack::of(&[Feature::NoopDealloc, Feature::Unsync]);

    #[inline]
    fn construct_allocator<'r>(storage: &'r Monotonic<'static>) -> Poly<'r> {
        Poly::new(AnyAlloc::new(storage))
    }
}

impl ResourceDescriptor<Polymorphic> for SyncPoolResource {
    type Storage = SyncPool;

    const NAME: &'static str = "sync_pool";

    const FEATURES: FeaturePack = FeaturePack::of(&[Feature::Sync]);

    #[inline]
    fn construct_allocator<'r>(storage: &'r SyncPool) -> Poly<'r> {
        Poly::new(AnyAlloc::new(storage))
    }
}

impl ResourceDescriptor<Polymorphic> for UnsyncPoolResource {
    type Storage = UnsyncPool;

    const NAME: &'static str = "unsync_pool";

    const FEATURES: FeaturePack = FeaturePack::EMPTY;

    #[inline]
    fn construct_allocator<'r>(storage: &'r UnsyncPool) -> Poly<'r> {
        Poly::new(AnyAlloc::new(storage))
    }
}
