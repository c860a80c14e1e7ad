//! Allocator and resource descriptor contracts.
//!
//! A _resource descriptor_ names one concrete backing resource (its
//! `Storage`), the features it contributes, and how to build an allocator
//! handle that draws from it. An _allocator descriptor_ names a family of
//! allocator handles, the features shared by the whole family, the ordered
//! list of resource descriptors the family can bind to, and the family's
//! default resource.

use core::any::{Any, TypeId};
use allocator_api2::alloc::Allocator;
use crate::feature::FeaturePack;
use crate::pack::PackConfig;
use crate::resource::AnyAlloc;

mod list;
mod algebra;

pub use self::list::{Nil, Cons, Here, There, Contains, DescriptorList, ResourceList};
pub use self::list::{HoldsStorage, UsesStorage};
pub use self::algebra::{StorageInfo, ResourceInfo, AllocatorInfo, Pair, DescriptorTable};
pub use self::algebra::find_resource_descriptor;

/// A concrete backing resource owned by an allocator pack.
pub trait Storage: Any + Sized {
    /// Returns a default instance configured by `config`; returns `None` if
    /// instances of this storage must be supplied to the pack.
    fn try_default(config: &PackConfig) -> Option<Self>;
}

/// Storage of resource descriptors that have no backing resource.
///
/// Stateless storage is never stored in a pack; every stateless resource
/// descriptor shares one static instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stateless;

impl Storage for Stateless {
    #[inline]
    fn try_default(_config: &PackConfig) -> Option<Stateless> {
        Some(Stateless)
    }
}

pub(crate) static STATELESS: Stateless = Stateless;

/// Returns `true` if `S` is the `Stateless` storage.
#[inline]
pub fn is_stateless<S: 'static>() -> bool {
    TypeId::of::<S>() == TypeId::of::<Stateless>()
}

/// Describes one backing resource that allocators of family `A` can bind to.
pub trait ResourceDescriptor<A: AllocatorDescriptor>: 'static {
    /// Concrete resource type, or `Stateless`.
    type Storage: Storage;

    const NAME: &'static str;

    /// Features of this resource; merged with `A::FEATURES` when ranked.
    const FEATURES: FeaturePack;

    /// Returns an allocator of family `A` that draws from `storage`.
    fn construct_allocator<'r>(storage: &'r Self::Storage) -> A::Alloc<'r>;
}

/// Describes a family of allocator handles and the resources it binds to.
pub trait AllocatorDescriptor: Sized + 'static {
    /// Allocator handle bound to a resource borrowed for `'r`.
    type Alloc<'r>: Allocator + Clone + 'r;

    /// Ordered list of resource descriptors of this family.
    type Resources: ResourceList<Self>;

    /// Resource used when an allocator of this family is requested by type.
    /// Must be one of `Resources`.
    type DefaultResource: ResourceDescriptor<Self>;

    const NAME: &'static str;

    /// Features shared by every resource of this family.
    const FEATURES: FeaturePack;

    /// Converts a handle of this family into a type-erased handle.
    fn erase<'r>(alloc: Self::Alloc<'r>) -> AnyAlloc<'r>;
}

/// Maps an allocator handle type back to the descriptor of its family.
pub trait Described {
    type Descriptor: AllocatorDescriptor;
}
