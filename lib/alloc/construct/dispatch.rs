//! Call-site capability dispatch behind `construct!`.
//!
//! A `Dispatch<T, A, Args>` is called through six references. Method lookup
//! strips one reference per step, and each step implements one convention,
//! highest priority first, so lookup stops at the first convention `T`
//! supports for `Args`.

use core::marker::PhantomData;
use crate::construct::{AllocFirst, AllocLast, AllocatorArg, Convention};
use crate::construct::{Factory, FactoryLast, TaggedNew};

/// Zero-sized stand-in for a construction of `T` from `A` and `Args`.
pub struct Dispatch<T, A, Args>(PhantomData<fn(A, Args) -> T>);

impl<T, A, Args> Dispatch<T, A, Args> {
    #[inline]
    pub fn new() -> Dispatch<T, A, Args> {
        Dispatch(PhantomData)
    }

    /// Infers `A` and `Args` from the values about to be passed.
    #[inline]
    pub fn of(_alloc: &A, _args: &Args) -> Dispatch<T, A, Args> {
        Dispatch(PhantomData)
    }
}

pub trait ViaFactory<T, A, Args> {
    fn build(&self, alloc: A, args: Args) -> T;

    fn convention(&self) -> Convention {
        Convention::Factory
    }
}

pub trait ViaFactoryLast<T, A, Args> {
    fn build(&self, alloc: A, args: Args) -> T;

    fn convention(&self) -> Convention {
        Convention::FactoryLast
    }
}

pub trait ViaTag<T, A, Args> {
    fn build(&self, alloc: A, args: Args) -> T;

    fn convention(&self) -> Convention {
        Convention::Tagged
    }
}

pub trait ViaAllocFirst<T, A, Args> {
    fn build(&self, alloc: A, args: Args) -> T;

    fn convention(&self) -> Convention {
        Convention::AllocFirst
    }
}

pub trait ViaAllocLast<T, A, Args> {
    fn build(&self, alloc: A, args: Args) -> T;

    fn convention(&self) -> Convention {
        Convention::AllocLast
    }
}

pub trait ViaOblivious<T, A, Args> {
    fn build(&self, alloc: A, args: Args) -> T;

    fn convention(&self) -> Convention {
        Convention::Oblivious
    }
}

impl<T: Factory<A, Args>, A, Args> ViaFactory<T, A, Args> for &&&&&Dispatch<T, A, Args> {
    #[inline]
    fn build(&self, alloc: A, args: Args) -> T {
        T::create(alloc, args)
    }
}

impl<T: FactoryLast<A, Args>, A, Args> ViaFactoryLast<T, A, Args> for &&&&Dispatch<T, A, Args> {
    #[inline]
    fn build(&self, alloc: A, args: Args) -> T {
        T::create_last(args, alloc)
    }
}

impl<T: TaggedNew<A, Args>, A, Args> ViaTag<T, A, Args> for &&&Dispatch<T, A, Args> {
    #[inline]
    fn build(&self, alloc: A, args: Args) -> T {
        T::new_tagged(AllocatorArg, alloc, args)
    }
}

impl<T: AllocFirst<A, Args>, A, Args> ViaAllocFirst<T, A, Args> for &&Dispatch<T, A, Args> {
    #[inline]
    fn build(&self, alloc: A, args: Args) -> T {
        T::new_alloc_first(alloc, args)
    }
}

impl<T: AllocLast<A, Args>, A, Args> ViaAllocLast<T, A, Args> for &Dispatch<T, A, Args> {
    #[inline]
    fn build(&self, alloc: A, args: Args) -> T {
        T::new_alloc_last(args, alloc)
    }
}

impl<T: From<Args>, A, Args> ViaOblivious<T, A, Args> for Dispatch<T, A, Args> {
    #[inline]
    fn build(&self, _alloc: A, args: Args) -> T {
        T::from(args)
    }
}
