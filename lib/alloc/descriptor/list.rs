use core::any::type_name;
use core::marker::PhantomData;
use crate::descriptor::{AllocatorDescriptor, AllocatorInfo, ResourceDescriptor, ResourceInfo};
use crate::error::ConfigError;
use crate::pack::{PackConfig, ResourceSet};
use crate::resource::AnyAlloc;

/// Empty type-level list.
#[derive(Clone, Copy, Debug, Default)]
pub struct Nil;

/// Type-level list with head `H` and tail `T`.
pub struct Cons<H, T>(PhantomData<fn() -> (H, T)>);

/// Index of the head of a type-level list.
pub struct Here;

/// Index into the tail of a type-level list.
pub struct There<I>(PhantomData<fn() -> I>);

/// Proof that a type-level list contains `T` at index `I`. The index is
/// inferred; an unsatisfied bound names the missing type at compile time.
#[diagnostic::on_unimplemented(
    message = "`{T}` is not in the configured descriptor list `{Self}`",
    label = "missing descriptor"
)]
pub trait Contains<T, I> {}

impl<T, Tail> Contains<T, Here> for Cons<T, Tail> {}

impl<T, H, Tail, I> Contains<T, There<I>> for Cons<H, Tail>
    where Tail: Contains<T, I>,
{
}

/// Proof that resource list `Self` of family `A` has a resource descriptor
/// with storage `S`, at index `I`.
pub trait HoldsStorage<A, S, I> {}

impl<A, S, R, Tail> HoldsStorage<A, S, Here> for Cons<R, Tail>
    where A: AllocatorDescriptor,
          R: ResourceDescriptor<A, Storage = S>,
{
}

impl<A, S, R, Tail, I> HoldsStorage<A, S, There<I>> for Cons<R, Tail>
    where Tail: HoldsStorage<A, S, I>,
{
}

/// Proof that some allocator descriptor of list `Self` binds to storage `S`.
///
/// The index `(Here, J)` names the head descriptor and its resource at `J`.
/// It is inferred when exactly one resource descriptor of the list uses
/// `S`; a storage shared by several descriptors needs the index spelled out.
#[diagnostic::on_unimplemented(
    message = "no resource descriptor of `{Self}` uses storage `{S}`",
    label = "storage not in the configured descriptor list"
)]
pub trait UsesStorage<S, I> {}

impl<S, D, Tail, J> UsesStorage<S, (Here, J)> for Cons<D, Tail>
    where D: AllocatorDescriptor,
          D::Resources: HoldsStorage<D, S, J>,
{
}

impl<S, D, Tail, I> UsesStorage<S, There<I>> for Cons<D, Tail>
    where Tail: UsesStorage<S, I>,
{
}

/// Builds a type-level descriptor list: `descriptors![Standard, Polymorphic]`.
#[macro_export]
macro_rules! descriptors {
    () => ($crate::descriptor::Nil);
    ($head:ty $(, $tail:ty)* $(,)?) => (
        $crate::descriptor::Cons<$head, $crate::descriptors!($($tail),*)>
    );
}

/// Ordered type-level list of allocator descriptors.
pub trait DescriptorList: 'static {
    const LEN: usize;

    /// Appends the metadata of every allocator descriptor to `out`.
    fn describe(out: &mut Vec<AllocatorInfo>);

    /// Default-constructs every missing storage of every resource.
    fn wire(resources: &mut ResourceSet, config: &PackConfig);

    /// Returns a type-erased allocator for the resource at `resource` of the
    /// allocator descriptor at `allocator`.
    fn erased<'r>(allocator: usize, resource: usize, resources: &'r ResourceSet)
        -> Result<AnyAlloc<'r>, ConfigError>;
}

impl DescriptorList for Nil {
    const LEN: usize = 0;

    #[inline]
    fn describe(_out: &mut Vec<AllocatorInfo>) {
        // nop
    }

    #[inline]
    fn wire(_resources: &mut ResourceSet, _config: &PackConfig) {
        // nop
    }

    fn erased<'r>(allocator: usize, resource: usize, _resources: &'r ResourceSet)
        -> Result<AnyAlloc<'r>, ConfigError>
    {
        Err(ConfigError::PairOutOfRange { allocator, resource })
    }
}

impl<D, T> DescriptorList for Cons<D, T>
    where D: AllocatorDescriptor,
          T: DescriptorList,
{
    const LEN: usize = 1 + T::LEN;

    fn describe(out: &mut Vec<AllocatorInfo>) {
        out.push(AllocatorInfo::of::<D>());
        T::describe(out);
    }

    fn wire(resources: &mut ResourceSet, config: &PackConfig) {
        <D::Resources as ResourceList<D>>::wire(resources, config);
        T::wire(resources, config);
    }

    fn erased<'r>(allocator: usize, resource: usize, resources: &'r ResourceSet)
        -> Result<AnyAlloc<'r>, ConfigError>
    {
        if allocator == 0 {
            <D::Resources as ResourceList<D>>::erased(resource, resources)
        } else {
            T::erased(allocator - 1, resource, resources)
                .map_err(|error| match error {
                    ConfigError::PairOutOfRange { allocator, resource } =>
                        ConfigError::PairOutOfRange { allocator: allocator + 1, resource },
                    error => error,
                })
        }
    }
}

/// Ordered type-level list of the resource descriptors of family `A`.
pub trait ResourceList<A: AllocatorDescriptor>: 'static {
    const LEN: usize;

    /// Appends the metadata of every resource descriptor to `out`.
    fn describe(out: &mut Vec<ResourceInfo>);

    /// Default-constructs every missing storage in this list.
    fn wire(resources: &mut ResourceSet, config: &PackConfig);

    /// Returns a type-erased allocator of family `A` for the resource at `index`.
    fn erased<'r>(index: usize, resources: &'r ResourceSet) -> Result<AnyAlloc<'r>, ConfigError>;
}

impl<A: AllocatorDescriptor> ResourceList<A> for Nil {
    const LEN: usize = 0;

    #[inline]
    fn describe(_out: &mut Vec<ResourceInfo>) {
        // nop
    }

    #[inline]
    fn wire(_resources: &mut ResourceSet, _config: &PackConfig) {
        // nop
    }

    fn erased<'r>(index: usize, _resources: &'r ResourceSet) -> Result<AnyAlloc<'r>, ConfigError> {
        Err(ConfigError::PairOutOfRange { allocator: 0, resource: index })
    }
}

impl<A, R, T> ResourceList<A> for Cons<R, T>
    where A: AllocatorDescriptor,
          R: ResourceDescriptor<A>,
          T: ResourceList<A>,
{
    const LEN: usize = 1 + T::LEN;

    fn describe(out: &mut Vec<ResourceInfo>) {
        out.push(ResourceInfo::of::<A, R>());
        T::describe(out);
    }

    fn wire(resources: &mut ResourceSet, config: &PackConfig) {
        resources.wire_default::<R::Storage>(config);
        T::wire(resources, config);
    }

    fn erased<'r>(index: usize, resources: &'r ResourceSet) -> Result<AnyAlloc<'r>, ConfigError> {
        if index != 0 {
            return T::erased(index - 1, resources)
                .map_err(|error| match error {
                    ConfigError::PairOutOfRange { allocator, resource } =>
                        ConfigError::PairOutOfRange { allocator, resource: resource + 1 },
                    error => error,
                });
        }
        match resources.get::<R::Storage>() {
            Some(storage) => Ok(A::erase(R::construct_allocator(storage))),
            None => Err(ConfigError::ResourceNotStored { name: type_name::<R::Storage>() }),
        }
    }
}
