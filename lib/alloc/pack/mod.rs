//! Allocator packs: the owner of every resource of a descriptor list.
//!
//! A `Pack` is wired once, at startup, by a `PackBuilder`: supplied
//! storages are stored as given, every other storage of the descriptor list
//! is default-constructed, and the general and local presets are resolved
//! to allocator/resource pairs. Allocators handed out by a pack borrow it,
//! so no allocator, and no object allocated through one, can outlive the
//! pack's resources.

use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;
use log::{debug, info, trace, warn};
use crate::construct::Construct;
use crate::descriptor::{AllocatorDescriptor, Contains, Described, DescriptorList};
use crate::descriptor::{DescriptorTable, ResourceDescriptor, ResourceInfo, Storage, UsesStorage};
use crate::error::ConfigError;
use crate::feature::{FeaturePack, Features, GeneralFeatures, LocalFeatures};
use crate::rank::{self, Selection};
use crate::resource::AnyAlloc;

mod config;
mod resources;

pub use self::config::PackConfig;
pub use self::resources::ResourceSet;

/// Resources and cached selections of descriptor list `L`.
pub struct Pack<L: DescriptorList> {
    table: DescriptorTable,
    resources: ResourceSet,
    general: Selection,
    local: Option<Selection>,
    config: PackConfig,
    marker: PhantomData<fn() -> L>,
}

/// Startup wiring of a `Pack`.
pub struct PackBuilder<L: DescriptorList> {
    config: PackConfig,
    resources: ResourceSet,
    marker: PhantomData<fn() -> L>,
}

impl<L: DescriptorList> PackBuilder<L> {
    pub fn new() -> PackBuilder<L> {
        PackBuilder {
            config: PackConfig::default(),
            resources: ResourceSet::new(),
            marker: PhantomData,
        }
    }

    /// Configures the storages this builder default-constructs.
    pub fn config(mut self, config: PackConfig) -> PackBuilder<L> {
        self.config = config;
        self
    }

    /// Supplies a storage instance, instead of a default-constructed one.
    pub fn with_resource<S: Storage>(mut self, storage: S) -> PackBuilder<L> {
        if self.resources.insert(storage).is_some() {
            debug!("replaced supplied resource storage {}", type_name::<S>());
        }
        self
    }

    /// Default-constructs the remaining storages, validates the wiring of
    /// the descriptor list, and resolves the general and local presets.
    pub fn build(self) -> Result<Pack<L>, ConfigError> {
        let PackBuilder { config, mut resources, .. } = self;
        let table = DescriptorTable::of::<L>();

        for (type_id, name) in resources.storages() {
            if !table.uses_storage(type_id) {
                warn!("resource storage {} supplied but not used by any resource descriptor", name);
            }
        }
        L::wire(&mut resources, &config);

        for allocator in table.flatten_allocators() {
            let (_, resource) = allocator.default_resource()?;
            check_stored(resource, &resources)?;
        }

        let general = rank::select(&table, &GeneralFeatures::PACK)?;
        check_stored(resource_of(&table, &general), &resources)?;

        let local = match rank::select(&table, &LocalFeatures::PACK) {
            Ok(selection) => {
                check_stored(resource_of(&table, &selection), &resources)?;
                Some(selection)
            }
            Err(ConfigError::NoMatch { .. }) => {
                debug!("no local allocator/resource pair; local allocation falls back to general");
                None
            }
            Err(error) => return Err(error),
        };

        info!("wired allocator pack: {} allocator descriptors, {} stored resources, general {}/{}{}",
              L::LEN, resources.len(), general.allocator, general.resource,
              match local {
                  Some(ref local) => format!(", local {}/{}", local.allocator, local.resource),
                  None => String::new(),
              });

        Ok(Pack {
            table,
            resources,
            general,
            local,
            config,
            marker: PhantomData,
        })
    }
}

impl<L: DescriptorList> Default for PackBuilder<L> {
    #[inline]
    fn default() -> PackBuilder<L> {
        PackBuilder::new()
    }
}

fn resource_of<'t>(table: &'t DescriptorTable, selection: &Selection) -> &'t ResourceInfo {
    &table.flatten_allocators()[selection.allocator_index()].resources[selection.resource_index()]
}

fn check_stored(resource: &ResourceInfo, resources: &ResourceSet) -> Result<(), ConfigError> {
    if resource.storage.stateless || resources.contains_id(resource.storage.type_id) {
        Ok(())
    } else {
        Err(ConfigError::ResourceNotStored { name: resource.storage.name })
    }
}

impl<L: DescriptorList> Pack<L> {
    /// Returns a pack with every storage default-constructed.
    #[inline]
    pub fn new() -> Result<Pack<L>, ConfigError> {
        PackBuilder::new().build()
    }

    #[inline]
    pub fn builder() -> PackBuilder<L> {
        PackBuilder::new()
    }

    #[inline]
    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    #[inline]
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    #[inline]
    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// Returns the stored instance of storage `S`.
    ///
    /// A storage no resource descriptor of `L` uses fails to compile:
    ///
    /// ```compile_fail
    /// use tg_alloc::pack::Pack;
    /// use tg_alloc::resource::SyncPool;
    /// use tg_alloc::standard::StandardOnly;
    ///
    /// let pack = Pack::<StandardOnly>::new().unwrap();
    /// let _ = pack.get_resource::<SyncPool, _>();
    /// ```
    #[inline]
    pub fn get_resource<S, I>(&self) -> Result<&S, ConfigError>
        where S: Storage,
              L: UsesStorage<S, I>,
    {
        self.stored::<S>()
    }

    fn stored<S: Storage>(&self) -> Result<&S, ConfigError> {
        self.resources.get::<S>()
            .ok_or(ConfigError::ResourceNotStored { name: type_name::<S>() })
    }

    /// Returns an allocator of family `D` bound to resource `R`.
    pub fn allocator_with<D, R, I, J>(&self) -> Result<D::Alloc<'_>, ConfigError>
        where D: AllocatorDescriptor,
              R: ResourceDescriptor<D>,
              L: Contains<D, I>,
              D::Resources: Contains<R, J>,
    {
        let storage = self.stored::<R::Storage>()?;
        Ok(R::construct_allocator(storage))
    }

    /// Returns an allocator handle of type `A`, bound to the default
    /// resource of its family.
    ///
    /// A handle whose family is not in `L` fails to compile:
    ///
    /// ```compile_fail
    /// use tg_alloc::pack::Pack;
    /// use tg_alloc::standard::{Poly, StandardOnly};
    ///
    /// let pack = Pack::<StandardOnly>::new().unwrap();
    /// let _ = pack.get_allocator::<Poly, _>();
    /// ```
    #[inline]
    pub fn get_allocator<A, I>(&self) -> Result<<A::Descriptor as AllocatorDescriptor>::Alloc<'_>, ConfigError>
        where A: Described,
              L: Contains<A::Descriptor, I>,
    {
        self.default_allocator::<A::Descriptor>()
    }

    fn default_allocator<D: AllocatorDescriptor>(&self) -> Result<D::Alloc<'_>, ConfigError> {
        let storage = self.stored::<<D::DefaultResource as ResourceDescriptor<D>>::Storage>()?;
        Ok(<D::DefaultResource as ResourceDescriptor<D>>::construct_allocator(storage))
    }

    /// Returns the pair that best fits feature set `F`.
    #[inline]
    pub fn select<F: Features>(&self) -> Result<Selection, ConfigError> {
        self.select_matching(&F::PACK)
    }

    /// Returns the pair that best fits `requested`.
    pub fn select_matching(&self, requested: &FeaturePack) -> Result<Selection, ConfigError> {
        if *requested == GeneralFeatures::PACK {
            return Ok(self.general);
        }
        match self.local {
            Some(local) if *requested == LocalFeatures::PACK => Ok(local),
            _ => rank::select(&self.table, requested),
        }
    }

    /// Returns the allocator of the pair that best fits feature set `F`.
    #[inline]
    pub fn allocator_for<F: Features>(&self) -> Result<AnyAlloc<'_>, ConfigError> {
        self.allocator_matching(&F::PACK)
    }

    /// Returns the allocator of the pair that best fits `requested`.
    pub fn allocator_matching(&self, requested: &FeaturePack) -> Result<AnyAlloc<'_>, ConfigError> {
        let selection = self.select_matching(requested)?;
        self.allocator_of(&selection)
    }

    /// Returns the allocator of a pair selected from this pack's table.
    ///
    /// A selection ranked from another descriptor list is rejected with
    /// `ConfigError::ForeignSelection`, even if its positions are in range.
    pub fn allocator_of(&self, selection: &Selection) -> Result<AnyAlloc<'_>, ConfigError> {
        if selection.list_id() != self.table.list_id() {
            return Err(ConfigError::ForeignSelection {
                allocator: selection.allocator,
                resource: selection.resource,
                expected: self.table.list_name(),
            });
        }
        L::erased(selection.allocator_index(), selection.resource_index(), &self.resources)
    }

    #[inline]
    pub fn general_selection(&self) -> &Selection {
        &self.general
    }

    #[inline]
    pub fn local_selection(&self) -> Option<&Selection> {
        self.local.as_ref()
    }

    /// Returns `true` if the descriptor list has a local-capable pair.
    #[inline]
    pub fn has_local(&self) -> bool {
        self.local.is_some()
    }

    /// Returns the allocator of the general preset.
    ///
    /// # Panics
    ///
    /// Panics if the general storage went missing after wiring.
    pub fn general_allocator(&self) -> AnyAlloc<'_> {
        match self.allocator_of(&self.general) {
            Ok(alloc) => alloc,
            Err(error) => panic!("{}", error),
        }
    }

    /// Returns the allocator of the local preset, or the general allocator
    /// if the descriptor list has no local-capable pair.
    ///
    /// # Panics
    ///
    /// Panics if the local storage went missing after wiring.
    pub fn local_allocator(&self) -> AnyAlloc<'_> {
        match self.local {
            Some(ref local) => match self.allocator_of(local) {
                Ok(alloc) => alloc,
                Err(error) => panic!("{}", error),
            },
            None => {
                trace!("no local allocator; falling back to general");
                self.general_allocator()
            }
        }
    }

    /// Constructs a `T` with the allocator that best fits feature set `F`.
    pub fn make<'a, T, F, Args>(&'a self, args: Args) -> Result<T, ConfigError>
        where F: Features,
              T: Construct<AnyAlloc<'a>, Args>,
    {
        let alloc = self.allocator_for::<F>()?;
        Ok(T::construct(alloc, args))
    }

    /// Constructs a `T` with the general allocator.
    #[inline]
    pub fn general<'a, T, Args>(&'a self, args: Args) -> T
        where T: Construct<AnyAlloc<'a>, Args>,
    {
        T::construct(self.general_allocator(), args)
    }

    /// Constructs a `T` with the local allocator.
    #[inline]
    pub fn local<'a, T, Args>(&'a self, args: Args) -> T
        where T: Construct<AnyAlloc<'a>, Args>,
    {
        T::construct(self.local_allocator(), args)
    }
}

impl<L: DescriptorList> fmt::Debug for Pack<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Pack")
            .field("resources", &self.resources)
            .field("general", &self.general)
            .field("local", &self.local)
            .field("config", &self.config)
            .finish()
    }
}
