#[macro_use]
extern crate tg_alloc;

use core::any::type_name;
use allocator_api2::alloc::Global;
use allocator_api2::vec::Vec;
use tg_alloc::construct::AllocString;
use tg_alloc::descriptor::{AllocatorDescriptor, DescriptorList, Here, ResourceDescriptor, Stateless, Storage};
use tg_alloc::error::ConfigError;
use tg_alloc::feature::{Feature, FeaturePack, GeneralFeatures, LocalFeatures};
use tg_alloc::pack::{Pack, PackConfig, ResourceSet};
use tg_alloc::resource::{AnyAlloc, Monotonic, PoolOptions, SyncPool, UnsyncPool};
use tg_alloc::standard::{MonotonicResource, Poly, Polymorphic, Standard};
use tg_alloc::standard::{StandardAndPolymorphic, StandardOnly, SyncPoolResource};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Family whose default resource is missing from its resource list.
struct Broken;

struct BrokenHeap;

impl AllocatorDescriptor for Broken {
    type Alloc<'r> = Global;
    type Resources = descriptors![];
    type DefaultResource = BrokenHeap;

    const NAME: &'static str = "broken";

    const FEATURES: FeaturePack = FeaturePack::EMPTY;

    fn erase<'r>(_alloc: Self::Alloc<'r>) -> AnyAlloc<'r> {
        AnyAlloc::global()
    }
}

impl ResourceDescriptor<Broken> for BrokenHeap {
    type Storage = Stateless;

    const NAME: &'static str = "broken_heap";

    const FEATURES: FeaturePack = FeaturePack::EMPTY;

    fn construct_allocator<'r>(_storage: &'r Stateless) -> Global {
        Global
    }
}

/// Storage that must be supplied to a pack.
struct Fixed {
    pool: UnsyncPool,
}

impl Fixed {
    fn new() -> Fixed {
        Fixed { pool: UnsyncPool::new(PoolOptions::default()) }
    }
}

impl Storage for Fixed {
    fn try_default(_config: &PackConfig) -> Option<Fixed> {
        None
    }
}

/// Family bound to supplied `Fixed` storage.
struct Pinned;

struct FixedResource;

impl AllocatorDescriptor for Pinned {
    type Alloc<'r> = Poly<'r>;
    type Resources = descriptors![FixedResource];
    type DefaultResource = FixedResource;

    const NAME: &'static str = "pinned";

    const FEATURES: FeaturePack = FeaturePack::of(&[Feature::Stateful, Feature::Unsync]);

    fn erase<'r>(alloc: Self::Alloc<'r>) -> AnyAlloc<'r> {
        alloc.resource()
    }
}

impl ResourceDescriptor<Pinned> for FixedResource {
    type Storage = Fixed;

    const NAME: &'static str = "fixed";

    const FEATURES: FeaturePack = FeaturePack::of(&[Feature::NoopDealloc]);

    fn construct_allocator<'r>(storage: &'r Fixed) -> Poly<'r> {
        Poly::new(AnyAlloc::new(&storage.pool))
    }
}

#[test]
fn test_wire_standard_and_polymorphic() {
    init();
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    assert_eq!(pack.general_selection().allocator, "standard");
    assert_eq!(pack.general_selection().resource, "default_heap");
    let local = pack.local_selection().unwrap();
    assert_eq!(local.allocator, "polymorphic");
    assert_eq!(local.resource, "monotonic");
    // One storage per distinct non-stateless storage type.
    assert_eq!(pack.resources().len(), 3);
    assert!(pack.get_resource::<Monotonic<'static>, _>().is_ok());
    assert!(pack.get_resource::<SyncPool, _>().is_ok());
    assert!(pack.get_resource::<UnsyncPool, _>().is_ok());
    // Stateless storage is shared by both families, so the index is named.
    assert!(pack.get_resource::<Stateless, (Here, Here)>().is_ok());
    assert!(pack.resources().contains::<Stateless>());
}

#[test]
fn test_general_allocation_uses_the_default_heap() {
    init();
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let mut vec: Vec<u32, AnyAlloc> = pack.general(());
    vec.extend_from_slice(&[1, 2, 3]);
    assert!(vec.allocator().same(&AnyAlloc::global()));
    assert_eq!(pack.get_resource::<Monotonic<'static>, _>().unwrap().live(), 0);
}

#[test]
fn test_local_allocation_uses_the_monotonic_resource() {
    init();
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let monotonic = pack.get_resource::<Monotonic<'static>, _>().unwrap();
    {
        let mut vec: Vec<u32, AnyAlloc> = pack.local(4usize);
        vec.push(7);
        assert!(vec.allocator().same(&AnyAlloc::new(monotonic)));
        assert_eq!(monotonic.live(), 1);
        let name: AllocString<AnyAlloc> = pack.local("local");
        assert_eq!(name, "local");
        assert_eq!(monotonic.live(), 2);
    }
    assert_eq!(monotonic.live(), 0);
    assert_eq!(monotonic.used(), 0);
}

#[test]
fn test_local_falls_back_to_general() {
    init();
    let pack = Pack::<StandardOnly>::new().unwrap();
    assert!(!pack.has_local());
    assert!(pack.local_allocator().same(&pack.general_allocator()));
    let vec: Vec<u8, AnyAlloc> = pack.local(());
    assert!(vec.allocator().same(&AnyAlloc::global()));
    assert_eq!(pack.resources().len(), 0);
}

#[test]
fn test_allocator_with() {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let alloc = pack.allocator_with::<Polymorphic, SyncPoolResource, _, _>().unwrap();
    let mut vec = Vec::new_in(alloc);
    vec.push(1u64);
    assert_eq!(pack.get_resource::<SyncPool, _>().unwrap().stats().live, 1);
    drop(vec);
    assert_eq!(pack.get_resource::<SyncPool, _>().unwrap().stats().live, 0);

    let alloc = pack.allocator_with::<Polymorphic, MonotonicResource, _, _>().unwrap();
    assert!(alloc.resource().same(&AnyAlloc::new(pack.get_resource::<Monotonic<'static>, _>().unwrap())));
}

#[test]
fn test_get_allocator_by_handle_type() {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let global: Global = pack.get_allocator::<Global, _>().unwrap();
    let mut vec = Vec::new_in(global);
    vec.push(1u8);
    let poly = pack.get_allocator::<Poly, _>().unwrap();
    assert!(poly.resource().same(&AnyAlloc::global()));
}

#[test]
fn test_allocator_of_rejects_foreign_selections() {
    init();
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let only = Pack::<StandardOnly>::new().unwrap();

    // Out of range in the other list.
    let local = *pack.local_selection().unwrap();
    assert_eq!(only.allocator_of(&local).unwrap_err(), ConfigError::ForeignSelection {
        allocator: "polymorphic",
        resource: "monotonic",
        expected: type_name::<StandardOnly>(),
    });

    // Same position, same names, but ranked from another list.
    let general = *pack.general_selection();
    let own = *only.general_selection();
    assert_eq!((general.allocator, general.resource), (own.allocator, own.resource));
    assert_eq!((general.allocator_index(), general.resource_index()), (own.allocator_index(), own.resource_index()));
    assert_ne!(general, own);
    assert!(only.allocator_of(only.general_selection()).is_ok());
    assert_eq!(only.allocator_of(&general).unwrap_err(), ConfigError::ForeignSelection {
        allocator: "standard",
        resource: "default_heap",
        expected: type_name::<StandardOnly>(),
    });

    let pinned = Pack::<descriptors![Standard, Pinned]>::builder()
        .with_resource(Fixed::new())
        .build()
        .unwrap();
    let local = *pinned.local_selection().unwrap();
    assert_eq!((local.allocator_index(), local.resource_index()), (1, 0));
    assert!(pack.allocator_of(&local).is_err());
    assert!(pinned.allocator_of(&local).is_ok());
}

#[test]
fn test_allocator_matching() {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let requested = FeaturePack::of(&[Feature::Stateful, Feature::Sync]);
    let selection = pack.select_matching(&requested).unwrap();
    assert_eq!((selection.allocator, selection.resource), ("polymorphic", "default_heap"));
    assert!(pack.allocator_matching(&requested).unwrap().same(&AnyAlloc::global()));

    let local = pack.allocator_for::<LocalFeatures>().unwrap();
    assert!(local.same(&pack.local_allocator()));
    let general = pack.allocator_for::<GeneralFeatures>().unwrap();
    assert!(general.same(&pack.general_allocator()));

    let requested = FeaturePack::of(&[Feature::Stateless, Feature::Unsync]);
    assert_eq!(pack.allocator_matching(&requested).unwrap_err(), ConfigError::NoMatch { requested });
}

#[test]
fn test_make_by_features() {
    let pack = Pack::<StandardAndPolymorphic>::new().unwrap();
    let vec = pack.make::<Vec<u16, AnyAlloc>, LocalFeatures, _>(16usize).unwrap();
    assert!(vec.capacity() >= 16);
    assert_eq!(pack.get_resource::<Monotonic<'static>, _>().unwrap().live(), 1);
}

#[test]
fn test_erased_pair_out_of_range() {
    let resources = ResourceSet::new();
    assert!(<StandardOnly as DescriptorList>::erased(0, 0, &resources).is_ok());
    assert_eq!(<StandardOnly as DescriptorList>::erased(1, 0, &resources).unwrap_err(),
               ConfigError::PairOutOfRange { allocator: 1, resource: 0 });
    assert_eq!(<StandardOnly as DescriptorList>::erased(0, 3, &resources).unwrap_err(),
               ConfigError::PairOutOfRange { allocator: 0, resource: 3 });
    assert_eq!(<StandardAndPolymorphic as DescriptorList>::erased(1, 5, &resources).unwrap_err(),
               ConfigError::PairOutOfRange { allocator: 1, resource: 5 });
    assert_eq!(<StandardAndPolymorphic as DescriptorList>::erased(1, 1, &resources).unwrap_err(),
               ConfigError::ResourceNotStored { name: type_name::<Monotonic<'static>>() });
}

#[test]
fn test_default_resource_must_be_listed() {
    init();
    let error = Pack::<descriptors![Standard, Broken]>::new().unwrap_err();
    assert_eq!(error, ConfigError::DefaultResourceMissing {
        allocator: "broken",
        resource: "broken_heap",
    });
}

#[test]
fn test_storage_without_default_must_be_supplied() {
    init();
    let error = Pack::<descriptors![Standard, Pinned]>::new().unwrap_err();
    assert_eq!(error, ConfigError::ResourceNotStored { name: type_name::<Fixed>() });
}

#[test]
fn test_supplied_storage() {
    init();
    let pack = Pack::<descriptors![Standard, Pinned]>::builder()
        .with_resource(Fixed::new())
        .build()
        .unwrap();
    let local = pack.local_selection().unwrap();
    assert_eq!((local.allocator, local.resource), ("pinned", "fixed"));
    assert_eq!(local.score, 150);
    let vec: Vec<u32, AnyAlloc> = pack.local(8usize);
    assert_eq!(pack.get_resource::<Fixed, _>().unwrap().pool.stats().live, 1);
    drop(vec);
}

#[test]
fn test_supplied_storage_replaces_default() {
    let pack = Pack::<StandardAndPolymorphic>::builder()
        .with_resource(Monotonic::with_chunk_size(AnyAlloc::global(), 256))
        .build()
        .unwrap();
    let monotonic = pack.get_resource::<Monotonic<'static>, _>().unwrap();
    let _vec: Vec<u8, AnyAlloc> = pack.local(16usize);
    assert_eq!(monotonic.reserved(), 256);
    assert_eq!(monotonic.chunk_count(), 1);
}

#[test]
fn test_unused_supplied_storage_is_kept() {
    init();
    let pack = Pack::<StandardOnly>::builder()
        .with_resource(Fixed::new())
        .build()
        .unwrap();
    // No descriptor uses `Fixed`, so it is only reachable through the set.
    assert!(pack.resources().contains::<Fixed>());
    assert_eq!(pack.resources().len(), 1);
}

#[test]
fn test_missing_resource() {
    let pack = Pack::<StandardOnly>::new().unwrap();
    assert!(pack.resources().get::<SyncPool>().is_none());
    let error = Pack::<descriptors![Standard, Pinned]>::new().unwrap_err();
    assert_eq!(error.to_string(), format!(
        "resource storage `{}` is not default-constructible and was not supplied",
        type_name::<Fixed>()));
}

#[test]
fn test_pack_config() {
    let config = PackConfig {
        monotonic_chunk_size: 1024,
        pool: PoolOptions {
            max_blocks_per_chunk: 4,
            largest_required_pool_block: 512,
        },
    };
    let pack = Pack::<StandardAndPolymorphic>::builder()
        .config(config)
        .build()
        .unwrap();
    assert_eq!(*pack.config(), config);
    assert_eq!(pack.get_resource::<SyncPool, _>().unwrap().options(), config.pool);
    let monotonic = pack.get_resource::<Monotonic<'static>, _>().unwrap();
    let vec: Vec<u8, AnyAlloc> = pack.local(16usize);
    assert_eq!(monotonic.reserved(), 1024);
    drop(vec);
}

#[test]
fn test_deserialize_pack_config() {
    let config: PackConfig = serde_json::from_str(r#"{"monotonic_chunk_size": 1024}"#).unwrap();
    assert_eq!(config.monotonic_chunk_size, 1024);
    assert_eq!(config.pool, PoolOptions::default());

    let config: PackConfig = serde_json::from_str(r#"{"pool": {"max_blocks_per_chunk": 8}}"#).unwrap();
    assert_eq!(config.monotonic_chunk_size, PackConfig::default().monotonic_chunk_size);
    assert_eq!(config.pool.max_blocks_per_chunk, 8);
    assert_eq!(config.pool.largest_required_pool_block, 4096);

    let json = serde_json::to_string(&PackConfig::default()).unwrap();
    assert_eq!(serde_json::from_str::<PackConfig>(&json).unwrap(), PackConfig::default());
}
