//! Scoped local allocation.
//!
//! A local object lives in a three phase chain, each phase borrowing the
//! one before it:
//!
//! 1. `LocalStorage<N>`: an inline buffer of `N` bytes.
//! 2. `LocalResource<'s>`: a `Monotonic` resource over the buffer, which
//!    overflows into the general allocator of a context.
//! 3. `Local<'r, T>`: an object constructed with the local resource.
//!
//! Because of the borrows, an object can only be dropped while its resource
//! and buffer are alive, and the resource only returns its overflow chunks
//! once every object is gone. `local!` declares all three phases in one
//! statement.

use core::fmt;
use core::mem::MaybeUninit;
use core::ops::{Deref, DerefMut};
use allocator_api2::alloc::AllocError;
use crate::construct::{CloneIn, Construct};
use crate::context::AllocContext;
use crate::resource::{AnyAlloc, Monotonic};

/// Inline buffer backing a local resource.
pub struct LocalStorage<const N: usize> {
    buffer: [MaybeUninit<u8>; N],
}

impl<const N: usize> LocalStorage<N> {
    #[inline]
    pub const fn new() -> LocalStorage<N> {
        LocalStorage { buffer: [MaybeUninit::uninit(); N] }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns a monotonic resource over this buffer that overflows into
    /// `upstream`.
    pub fn bind<'s>(&'s mut self, upstream: AnyAlloc<'s>) -> LocalResource<'s> {
        LocalResource { resource: Monotonic::with_buffer(&mut self.buffer, upstream) }
    }
}

impl<const N: usize> Default for LocalStorage<N> {
    #[inline]
    fn default() -> LocalStorage<N> {
        LocalStorage::new()
    }
}

/// Monotonic resource over a borrowed local buffer.
pub struct LocalResource<'s> {
    resource: Monotonic<'s>,
}

impl<'s> LocalResource<'s> {
    /// Returns an allocator that draws from this resource.
    #[inline]
    pub fn allocator(&self) -> AnyAlloc<'_> {
        AnyAlloc::new(&self.resource)
    }

    #[inline]
    pub fn resource(&self) -> &Monotonic<'s> {
        &self.resource
    }

    /// Returns the allocator this resource overflows into.
    #[inline]
    pub fn upstream(&self) -> AnyAlloc<'s> {
        self.resource.upstream()
    }

    /// Constructs a `T` with this resource.
    pub fn make<'r, T, Args>(&'r self, args: Args) -> Local<'r, T>
        where T: Construct<AnyAlloc<'r>, Args>,
    {
        Local {
            object: T::construct(self.allocator(), args),
            resource: &self.resource,
        }
    }
}

impl<'s> fmt::Debug for LocalResource<'s> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LocalResource")
            .field("live", &self.resource.live())
            .field("used", &self.resource.used())
            .field("reserved", &self.resource.reserved())
            .finish()
    }
}

/// An object bound to a local resource.
pub struct Local<'r, T> {
    object: T,
    resource: &'r Monotonic<'r>,
}

impl<'r, T> Local<'r, T> {
    /// Returns the resource that allocated this object.
    #[inline]
    pub fn resource(&self) -> &'r Monotonic<'r> {
        self.resource
    }

    /// Returns a copy of this object allocated by the general allocator of
    /// `ctx`, so it can outlive the local resource.
    #[inline]
    pub fn promote<'g, C, U>(&self, ctx: &'g C) -> U
        where C: AllocContext + ?Sized,
              T: CloneIn<AnyAlloc<'g>, U>,
    {
        self.object.clone_in(ctx.general_allocator())
    }

    /// Returns a copy of this object allocated by the general allocator of
    /// `ctx`; returns an error if the allocator is exhausted.
    #[inline]
    pub fn try_promote<'g, C, U>(&self, ctx: &'g C) -> Result<U, AllocError>
        where C: AllocContext + ?Sized,
              T: CloneIn<AnyAlloc<'g>, U>,
    {
        self.object.try_clone_in(ctx.general_allocator())
    }
}

impl<'r, T> Deref for Local<'r, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.object
    }
}

impl<'r, T> DerefMut for Local<'r, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.object
    }
}

impl<'r, T: fmt::Debug> fmt::Debug for Local<'r, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.object, f)
    }
}

/// Declares a local object, with its resource and an inline buffer of
/// `CAP` bytes, in one statement:
///
/// ```ignore
/// local!(let mut names: Vec<u8, AnyAlloc> = (pack, 16) in 256);
/// ```
///
/// The buffer overflows into the general allocator of the context. All
/// three phases drop at the end of the enclosing scope, object first.
#[macro_export]
macro_rules! local {
    (let mut $name:ident : $ty:ty = ($ctx:expr, $args:expr) in $cap:expr) => (
        let mut __local_storage = $crate::local::LocalStorage::<{ $cap }>::new();
        let __local_resource = __local_storage.bind($crate::context::AllocContext::general_allocator(&$ctx));
        let mut $name: $crate::local::Local<'_, $ty> = __local_resource.make($args);
    );
    (let $name:ident : $ty:ty = ($ctx:expr, $args:expr) in $cap:expr) => (
        let mut __local_storage = $crate::local::LocalStorage::<{ $cap }>::new();
        let __local_resource = __local_storage.bind($crate::context::AllocContext::general_allocator(&$ctx));
        let $name: $crate::local::Local<'_, $ty> = __local_resource.make($args);
    );
}
