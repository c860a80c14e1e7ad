use core::any::{type_name, TypeId};
use crate::descriptor::{AllocatorDescriptor, Described, DescriptorList, ResourceDescriptor};
use crate::descriptor::{ResourceList, Storage, is_stateless};
use crate::error::ConfigError;
use crate::feature::FeaturePack;
use crate::rank::Selection;

/// Identity of a storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageInfo {
    pub name: &'static str,
    pub type_id: TypeId,
    /// `true` for `Stateless` storage, which is never stored in a pack.
    pub stateless: bool,
}

impl StorageInfo {
    pub fn of<S: Storage>() -> StorageInfo {
        StorageInfo {
            name: type_name::<S>(),
            type_id: TypeId::of::<S>(),
            stateless: is_stateless::<S>(),
        }
    }
}

/// Metadata of one resource descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    pub name: &'static str,
    /// Type of the resource descriptor.
    pub descriptor: TypeId,
    pub storage: StorageInfo,
    pub features: FeaturePack,
}

impl ResourceInfo {
    pub fn of<A, R>() -> ResourceInfo
        where A: AllocatorDescriptor,
              R: ResourceDescriptor<A>,
    {
        ResourceInfo {
            name: R::NAME,
            descriptor: TypeId::of::<R>(),
            storage: StorageInfo::of::<R::Storage>(),
            features: R::FEATURES,
        }
    }

    /// Returns `false` if allocators bound to this resource need no storage.
    #[inline]
    pub fn has_resource(&self) -> bool {
        !self.storage.stateless
    }
}

/// Metadata of one allocator descriptor and its resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatorInfo {
    pub name: &'static str,
    /// Type of the allocator descriptor.
    pub descriptor: TypeId,
    /// Type name of the allocator handle.
    pub allocator: &'static str,
    pub features: FeaturePack,
    pub resources: Vec<ResourceInfo>,
    /// Type of the default resource descriptor.
    pub default_resource: TypeId,
    pub default_resource_name: &'static str,
}

impl AllocatorInfo {
    pub fn of<D: AllocatorDescriptor>() -> AllocatorInfo {
        let mut resources = Vec::with_capacity(<D::Resources as ResourceList<D>>::LEN);
        <D::Resources as ResourceList<D>>::describe(&mut resources);
        AllocatorInfo {
            name: D::NAME,
            descriptor: TypeId::of::<D>(),
            allocator: type_name::<D::Alloc<'static>>(),
            features: D::FEATURES,
            resources,
            default_resource: TypeId::of::<D::DefaultResource>(),
            default_resource_name: <D::DefaultResource as ResourceDescriptor<D>>::NAME,
        }
    }

    /// Returns the position and metadata of the default resource.
    pub fn default_resource(&self) -> Result<(usize, &ResourceInfo), ConfigError> {
        self.resources.iter()
            .enumerate()
            .find(|(_, resource)| resource.descriptor == self.default_resource)
            .ok_or(ConfigError::DefaultResourceMissing {
                allocator: self.name,
                resource: self.default_resource_name,
            })
    }
}

/// One allocator descriptor bound to one of its resource descriptors.
#[derive(Clone, Copy, Debug)]
pub struct Pair<'t> {
    pub allocator_index: usize,
    pub resource_index: usize,
    pub allocator: &'t AllocatorInfo,
    pub resource: &'t ResourceInfo,
}

impl<'t> Pair<'t> {
    /// Returns the allocator features merged with the resource features.
    #[inline]
    pub fn features(&self) -> FeaturePack {
        FeaturePack::merge(self.allocator.features, self.resource.features)
    }

    /// Scores this pair against `requested`.
    #[inline]
    pub fn rank(&self, requested: &FeaturePack) -> i32 {
        self.features().rank(requested)
    }
}

/// Runtime snapshot of a type-level descriptor list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorTable {
    /// Identity of the descriptor list this table describes.
    list: TypeId,
    list_name: &'static str,
    allocators: Vec<AllocatorInfo>,
}

impl DescriptorTable {
    pub fn of<L: DescriptorList>() -> DescriptorTable {
        let mut allocators = Vec::with_capacity(L::LEN);
        L::describe(&mut allocators);
        DescriptorTable {
            list: TypeId::of::<L>(),
            list_name: type_name::<L>(),
            allocators,
        }
    }

    /// Returns the type id of the descriptor list this table describes.
    #[inline]
    pub fn list_id(&self) -> TypeId {
        self.list
    }

    #[inline]
    pub fn list_name(&self) -> &'static str {
        self.list_name
    }

    /// Returns `true` if `selection` was ranked from this table, and names
    /// one of its pairs.
    pub fn owns(&self, selection: &Selection) -> bool {
        selection.list_id() == self.list
            && self.allocators.get(selection.allocator_index())
                .map_or(false, |allocator| selection.resource_index() < allocator.resources.len())
    }

    /// Returns every allocator descriptor, in declaration order.
    #[inline]
    pub fn flatten_allocators(&self) -> &[AllocatorInfo] {
        &self.allocators
    }

    /// Returns every distinct resource descriptor, in order of first
    /// appearance.
    pub fn extract_resource_descriptors(&self) -> Vec<&ResourceInfo> {
        let mut resources: Vec<&ResourceInfo> = Vec::new();
        for resource in self.allocators.iter().flat_map(|allocator| allocator.resources.iter()) {
            if !resources.iter().any(|seen| seen.descriptor == resource.descriptor) {
                resources.push(resource);
            }
        }
        resources
    }

    /// Returns one pair per resource per allocator descriptor, ordered by
    /// allocator descriptor, then by resource descriptor.
    pub fn cross_product(&self) -> Vec<Pair<'_>> {
        let mut pairs = Vec::new();
        for (allocator_index, allocator) in self.allocators.iter().enumerate() {
            for (resource_index, resource) in allocator.resources.iter().enumerate() {
                pairs.push(Pair { allocator_index, resource_index, allocator, resource });
            }
        }
        pairs
    }

    /// Returns the pairs that score above zero against `requested`.
    pub fn filter_by_features(&self, requested: &FeaturePack) -> Vec<Pair<'_>> {
        self.cross_product()
            .into_iter()
            .filter(|pair| pair.rank(requested) > 0)
            .collect()
    }

    /// Returns the position and metadata of allocator descriptor `D`.
    pub fn find_allocator_descriptor<D: 'static>(&self) -> Result<(usize, &AllocatorInfo), ConfigError> {
        let descriptor = TypeId::of::<D>();
        self.allocators.iter()
            .enumerate()
            .find(|(_, allocator)| allocator.descriptor == descriptor)
            .ok_or(ConfigError::MissingAllocatorDescriptor { name: type_name::<D>() })
    }

    /// Returns the descriptor of the family of allocator handle `A`.
    #[inline]
    pub fn find_allocator_for<A: Described>(&self) -> Result<(usize, &AllocatorInfo), ConfigError> {
        self.find_allocator_descriptor::<A::Descriptor>()
    }

    /// Returns `true` if any resource descriptor binds to storage `type_id`.
    pub fn uses_storage(&self, type_id: TypeId) -> bool {
        self.allocators.iter()
            .flat_map(|allocator| allocator.resources.iter())
            .any(|resource| resource.storage.type_id == type_id)
    }
}

/// Returns the position and metadata of resource descriptor `R` among
/// `resources`.
pub fn find_resource_descriptor<'t, R, I>(resources: I) -> Result<(usize, &'t ResourceInfo), ConfigError>
    where R: 'static,
          I: IntoIterator<Item = &'t ResourceInfo>,
{
    let descriptor = TypeId::of::<R>();
    resources.into_iter()
        .enumerate()
        .find(|(_, resource)| resource.descriptor == descriptor)
        .ok_or(ConfigError::MissingResourceDescriptor { name: type_name::<R>() })
}
