//! Construction of objects through whichever allocator convention they
//! accept.
//!
//! Conventions, in priority order:
//!
//! | Convention    | Call                                      |
//! |---------------|-------------------------------------------|
//! | `Factory`     | `T::create(alloc, args)`                  |
//! | `FactoryLast` | `T::create_last(args, alloc)`             |
//! | `Tagged`      | `T::new_tagged(AllocatorArg, alloc, args)` |
//! | `AllocFirst`  | `T::new_alloc_first(alloc, args)`         |
//! | `AllocLast`   | `T::new_alloc_last(args, alloc)`          |
//! | `Oblivious`   | `T::from(args)`                           |
//!
//! Constructors taking several arguments take them as one tuple. The
//! convention is chosen per argument type: a type may build from a `u32`
//! with a factory and from a `&str` allocator-last.
//!
//! Two entry points dispatch statically:
//!
//! - `construct!(T; alloc, args)` inspects the capabilities of `T` for the
//!   argument type at the call site, and picks the first convention that
//!   fits. Types with no allocator-accepting constructor are built with
//!   `From`, without declaring anything.
//! - `construct::<T>(alloc, args)`, and everything generic over
//!   `Construct`, uses the conventions a type declared per argument type
//!   with `allocator_aware!`. The highest priority declared convention wins.
//!
//! Both fail to compile when no convention fits.

use allocator_api2::alloc::Allocator;
use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;

mod clone;
mod string;
#[doc(hidden)]
pub mod dispatch;

pub use self::clone::CloneIn;
pub use self::string::AllocString;

/// Tag that leads the arguments of a tagged constructor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorArg;

/// Allocator passing convention of a constructor, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Convention {
    Factory = 0,
    FactoryLast = 1,
    Tagged = 2,
    AllocFirst = 3,
    AllocLast = 4,
    Oblivious = 5,
}

impl Convention {
    /// Every convention, highest priority first.
    pub const ALL: [Convention; 6] = [
        Convention::Factory,
        Convention::FactoryLast,
        Convention::Tagged,
        Convention::AllocFirst,
        Convention::AllocLast,
        Convention::Oblivious,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the highest priority convention among `capabilities`, or
    /// `Oblivious` if there are none.
    pub const fn resolve(capabilities: &[Convention]) -> Convention {
        let mut best = Convention::Oblivious;
        let mut i = 0;
        while i < capabilities.len() {
            if capabilities[i].code() < best.code() {
                best = capabilities[i];
            }
            i += 1;
        }
        best
    }

    pub const fn name(self) -> &'static str {
        match self {
            Convention::Factory => "factory",
            Convention::FactoryLast => "factory_last",
            Convention::Tagged => "tagged",
            Convention::AllocFirst => "alloc_first",
            Convention::AllocLast => "alloc_last",
            Convention::Oblivious => "oblivious",
        }
    }
}

/// Static factory taking the allocator first.
pub trait Factory<A, Args>: Sized {
    fn create(alloc: A, args: Args) -> Self;
}

/// Static factory taking the allocator last.
pub trait FactoryLast<A, Args>: Sized {
    fn create_last(args: Args, alloc: A) -> Self;
}

/// Constructor taking an `AllocatorArg` tag, then the allocator.
pub trait TaggedNew<A, Args>: Sized {
    fn new_tagged(tag: AllocatorArg, alloc: A, args: Args) -> Self;
}

/// Constructor taking the allocator first.
pub trait AllocFirst<A, Args>: Sized {
    fn new_alloc_first(alloc: A, args: Args) -> Self;
}

/// Constructor taking the allocator last.
pub trait AllocLast<A, Args>: Sized {
    fn new_alloc_last(args: Args, alloc: A) -> Self;
}

/// Compile-time construction strategy.
pub trait Strategy {
    const CONVENTION: Convention;
}

/// Construction of `T` from an allocator of type `A` and `Args`.
pub trait Apply<T, A, Args>: Strategy {
    fn apply(alloc: A, args: Args) -> T;
}

pub struct ByFactory;
pub struct ByFactoryLast;
pub struct ByTag;
pub struct ByAllocFirst;
pub struct ByAllocLast;
pub struct ByOblivious;

impl Strategy for ByFactory {
    const CONVENTION: Convention = Convention::Factory;
}

impl Strategy for ByFactoryLast {
    const CONVENTION: Convention = Convention::FactoryLast;
}

impl Strategy for ByTag {
    const CONVENTION: Convention = Convention::Tagged;
}

impl Strategy for ByAllocFirst {
    const CONVENTION: Convention = Convention::AllocFirst;
}

impl Strategy for ByAllocLast {
    const CONVENTION: Convention = Convention::AllocLast;
}

impl Strategy for ByOblivious {
    const CONVENTION: Convention = Convention::Oblivious;
}

impl<T: Factory<A, Args>, A, Args> Apply<T, A, Args> for ByFactory {
    #[inline]
    fn apply(alloc: A, args: Args) -> T {
        T::create(alloc, args)
    }
}

impl<T: FactoryLast<A, Args>, A, Args> Apply<T, A, Args> for ByFactoryLast {
    #[inline]
    fn apply(alloc: A, args: Args) -> T {
        T::create_last(args, alloc)
    }
}

impl<T: TaggedNew<A, Args>, A, Args> Apply<T, A, Args> for ByTag {
    #[inline]
    fn apply(alloc: A, args: Args) -> T {
        T::new_tagged(AllocatorArg, alloc, args)
    }
}

impl<T: AllocFirst<A, Args>, A, Args> Apply<T, A, Args> for ByAllocFirst {
    #[inline]
    fn apply(alloc: A, args: Args) -> T {
        T::new_alloc_first(alloc, args)
    }
}

impl<T: AllocLast<A, Args>, A, Args> Apply<T, A, Args> for ByAllocLast {
    #[inline]
    fn apply(alloc: A, args: Args) -> T {
        T::new_alloc_last(args, alloc)
    }
}

impl<T: From<Args>, A, Args> Apply<T, A, Args> for ByOblivious {
    #[inline]
    fn apply(_alloc: A, args: Args) -> T {
        T::from(args)
    }
}

/// Maps a resolved convention code to its strategy.
pub struct Resolved<const C: u8>;

pub trait Pick {
    type Strategy: Strategy;
}

impl Pick for Resolved<0> {
    type Strategy = ByFactory;
}

impl Pick for Resolved<1> {
    type Strategy = ByFactoryLast;
}

impl Pick for Resolved<2> {
    type Strategy = ByTag;
}

impl Pick for Resolved<3> {
    type Strategy = ByAllocFirst;
}

impl Pick for Resolved<4> {
    type Strategy = ByAllocLast;
}

impl Pick for Resolved<5> {
    type Strategy = ByOblivious;
}

/// A type that declared how it accepts an allocator along with `Args`.
pub trait AllocatorAware<Args> {
    type Strategy: Strategy;
}

/// Construction from an allocator of type `A` and `Args`.
pub trait Construct<A, Args>: Sized {
    fn construct(alloc: A, args: Args) -> Self;
}

impl<T, A, Args> Construct<A, Args> for T
    where T: AllocatorAware<Args>,
          <T as AllocatorAware<Args>>::Strategy: Apply<T, A, Args>,
{
    #[inline]
    fn construct(alloc: A, args: Args) -> T {
        <<T as AllocatorAware<Args>>::Strategy as Apply<T, A, Args>>::apply(alloc, args)
    }
}

/// Constructs a `T` from `args`, passing `alloc` the way `T` declared it
/// expects for `Args`.
#[inline]
pub fn construct<T, A, Args>(alloc: A, args: Args) -> T
    where T: Construct<A, Args>,
{
    T::construct(alloc, args)
}

/// Returns the convention a `T` is constructed with from `Args`.
#[inline]
pub const fn convention_of<T: AllocatorAware<Args>, Args>() -> Convention {
    <<T as AllocatorAware<Args>>::Strategy as Strategy>::CONVENTION
}

/// Declares the allocator conventions a type supports, per argument type.
///
/// ```ignore
/// allocator_aware!(Buffer {
///     usize => AllocFirst, AllocLast;
///     &'static str => AllocLast;
/// });
/// allocator_aware!(impl<'a> Span<'a> { &'a str => Factory });
/// allocator_aware!(Plain);
/// ```
///
/// Each argument type resolves to its highest priority convention at
/// compile time. A type declared without conventions is constructed
/// obliviously, with `From`, whatever the arguments.
#[macro_export]
macro_rules! allocator_aware {
    (@impl [$($gen:tt),*] $ty:ty { $args:ty => $($cap:ident),+ ; $($rest:tt)* }) => (
        impl<$($gen),*> $crate::construct::AllocatorAware<$args> for $ty {
            type Strategy = <$crate::construct::Resolved<{
                $crate::construct::Convention::resolve(&[$($crate::construct::Convention::$cap),+]).code()
            }> as $crate::construct::Pick>::Strategy;
        }
        $crate::allocator_aware!(@impl [$($gen),*] $ty { $($rest)* });
    );
    (@impl [$($gen:tt),*] $ty:ty { $args:ty => $($cap:ident),+ }) => (
        $crate::allocator_aware!(@impl [$($gen),*] $ty { $args => $($cap),+ ; });
    );
    (@impl [$($gen:tt),*] $ty:ty { }) => ();
    (@impl [$($gen:tt),*] $ty:ty) => (
        impl<$($gen,)* __Args> $crate::construct::AllocatorAware<__Args> for $ty {
            type Strategy = $crate::construct::ByOblivious;
        }
    );
    (impl<$($gen:tt),+> $ty:ty { $($body:tt)* }) => (
        $crate::allocator_aware!(@impl [$($gen),+] $ty { $($body)* });
    );
    (impl<$($gen:tt),+> $ty:ty) => (
        $crate::allocator_aware!(@impl [$($gen),+] $ty);
    );
    ($ty:ty { $($body:tt)* }) => (
        $crate::allocator_aware!(@impl [] $ty { $($body)* });
    );
    ($ty:ty) => (
        $crate::allocator_aware!(@impl [] $ty);
    );
}

/// Constructs a `T` from `args` with the first convention, in priority
/// order, that `T` supports for the type of `args`:
///
/// ```ignore
/// let record = construct!(Record; alloc, ("name", 4usize));
/// ```
///
/// Capabilities are inspected at the call site, so `T`, and the types of
/// `alloc` and `args`, must be concrete there; generic code goes through
/// `Construct` instead. A type with no allocator-accepting constructor for
/// `args` is built with `From`, ignoring the allocator.
#[macro_export]
macro_rules! construct {
    ($ty:ty; $alloc:expr, $args:expr $(,)?) => ({
        #[allow(unused_imports)]
        use $crate::construct::dispatch::{ViaFactory, ViaFactoryLast, ViaTag};
        #[allow(unused_imports)]
        use $crate::construct::dispatch::{ViaAllocFirst, ViaAllocLast, ViaOblivious};
        let alloc = $alloc;
        let args = $args;
        let dispatch = $crate::construct::dispatch::Dispatch::<$ty, _, _>::of(&alloc, &args);
        (&&&&&&dispatch).build(alloc, args)
    });
}

/// Returns the convention `construct!` picks for a `T` built from an
/// allocator and arguments of the given types.
#[macro_export]
macro_rules! convention_for {
    ($ty:ty; $alloc:ty, $args:ty) => ({
        #[allow(unused_imports)]
        use $crate::construct::dispatch::{ViaFactory, ViaFactoryLast, ViaTag};
        #[allow(unused_imports)]
        use $crate::construct::dispatch::{ViaAllocFirst, ViaAllocLast, ViaOblivious};
        let dispatch = $crate::construct::dispatch::Dispatch::<$ty, $alloc, $args>::new();
        (&&&&&&dispatch).convention()
    });
}

impl<T, A: Allocator> AllocLast<A, ()> for Vec<T, A> {
    #[inline]
    fn new_alloc_last(_args: (), alloc: A) -> Vec<T, A> {
        Vec::new_in(alloc)
    }
}

impl<T, A: Allocator> AllocLast<A, usize> for Vec<T, A> {
    #[inline]
    fn new_alloc_last(capacity: usize, alloc: A) -> Vec<T, A> {
        Vec::with_capacity_in(capacity, alloc)
    }
}

impl<T: Clone, A: Allocator> AllocLast<A, &[T]> for Vec<T, A> {
    fn new_alloc_last(items: &[T], alloc: A) -> Vec<T, A> {
        let mut vec = Vec::with_capacity_in(items.len(), alloc);
        vec.extend_from_slice(items);
        vec
    }
}

impl<T, A: Allocator> AllocatorAware<()> for Vec<T, A> {
    type Strategy = ByAllocLast;
}

impl<T, A: Allocator> AllocatorAware<usize> for Vec<T, A> {
    type Strategy = ByAllocLast;
}

impl<'s, T: Clone, A: Allocator> AllocatorAware<&'s [T]> for Vec<T, A> {
    type Strategy = ByAllocLast;
}

impl<T, A: Allocator> AllocLast<A, T> for Box<T, A> {
    #[inline]
    fn new_alloc_last(value: T, alloc: A) -> Box<T, A> {
        Box::new_in(value, alloc)
    }
}

impl<T, A: Allocator> AllocatorAware<T> for Box<T, A> {
    type Strategy = ByAllocLast;
}

allocator_aware!(());
allocator_aware!(bool);
allocator_aware!(char);
allocator_aware!(u8);
allocator_aware!(u16);
allocator_aware!(u32);
allocator_aware!(u64);
allocator_aware!(usize);
allocator_aware!(i8);
allocator_aware!(i16);
allocator_aware!(i32);
allocator_aware!(i64);
allocator_aware!(isize);
allocator_aware!(f32);
allocator_aware!(f64);
allocator_aware!(std::string::String);
