//! Allocation contexts: anything that can hand out a general allocator,
//! and possibly a local one.

use log::trace;
use crate::construct::Construct;
use crate::descriptor::DescriptorList;
use crate::local::LocalResource;
use crate::pack::Pack;
use crate::resource::AnyAlloc;

/// Source of the allocators used by `make_general` and `make_local`.
pub trait AllocContext {
    /// Returns the allocator for general purpose objects.
    fn general_allocator(&self) -> AnyAlloc<'_>;

    /// Returns the allocator for short-lived local objects, or `None` if
    /// this context has no local strategy.
    #[inline]
    fn local_allocator(&self) -> Option<AnyAlloc<'_>> {
        None
    }
}

/// A value that owns or borrows an allocator pack.
pub trait PackHolder {
    type List: DescriptorList;

    fn alloc_pack(&self) -> &Pack<Self::List>;
}

impl<H: PackHolder> AllocContext for H {
    #[inline]
    fn general_allocator(&self) -> AnyAlloc<'_> {
        self.alloc_pack().general_allocator()
    }

    #[inline]
    fn local_allocator(&self) -> Option<AnyAlloc<'_>> {
        AllocContext::local_allocator(self.alloc_pack())
    }
}

impl<L: DescriptorList> AllocContext for Pack<L> {
    #[inline]
    fn general_allocator(&self) -> AnyAlloc<'_> {
        Pack::general_allocator(self)
    }

    fn local_allocator(&self) -> Option<AnyAlloc<'_>> {
        if self.has_local() {
            Some(Pack::local_allocator(self))
        } else {
            None
        }
    }
}

impl<'r> AllocContext for AnyAlloc<'r> {
    #[inline]
    fn general_allocator(&self) -> AnyAlloc<'_> {
        *self
    }
}

impl<'s> AllocContext for LocalResource<'s> {
    #[inline]
    fn general_allocator(&self) -> AnyAlloc<'_> {
        self.upstream()
    }

    #[inline]
    fn local_allocator(&self) -> Option<AnyAlloc<'_>> {
        Some(self.allocator())
    }
}

/// Constructs a `T` with the general allocator of `ctx`.
#[inline]
pub fn make_general<'c, T, C, Args>(ctx: &'c C, args: Args) -> T
    where C: AllocContext + ?Sized,
          T: Construct<AnyAlloc<'c>, Args>,
{
    T::construct(ctx.general_allocator(), args)
}

/// Constructs a `T` with the local allocator of `ctx`, or with its general
/// allocator if `ctx` has no local strategy.
pub fn make_local<'c, T, C, Args>(ctx: &'c C, args: Args) -> T
    where C: AllocContext + ?Sized,
          T: Construct<AnyAlloc<'c>, Args>,
{
    match ctx.local_allocator() {
        Some(alloc) => T::construct(alloc, args),
        None => {
            trace!("context has no local allocator; constructing with the general allocator");
            T::construct(ctx.general_allocator(), args)
        }
    }
}
