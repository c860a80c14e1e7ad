//! # Allocator Packs
//!
//! Feature-ranked allocator selection: callers declare the characteristics
//! they want from an allocator, and an allocator pack picks the allocator
//! and backing resource that best fits them.
//!
//! ## Design goals
//!
//! __Declarative__
//! Call sites name desired features, such as thread safety or free
//! deallocation, never concrete allocator types.
//!
//! __Static__
//! Descriptor membership and construction conventions are checked at compile
//! time; only ranking runs at run time, once per pack for the presets.
//!
//! __Scoped__
//! Allocators borrow the pack that owns their resources, so no allocator,
//! and no object it allocated, can outlive its resource.
//!
//! __Convention agnostic__
//! Objects are constructed through whichever allocator convention their type
//! supports, including none at all.
//!
//! ## Terminology
//!
//! - _Feature_: one polarity of an allocator trait, such as `sync` or
//!   `unsync`. The two polarities of a trait form an _axis_.
//! - _Feature pack_: a partial assignment of features to axes.
//! - _Resource descriptor_: a backing resource, its storage type, and its
//!   features.
//! - _Allocator descriptor_: a family of allocator handles, its features,
//!   and the resources it can bind to.
//! - _Pair_: an allocator descriptor bound to one of its resources; the unit
//!   of ranking.
//! - _Wiring_: the validating startup phase that builds a pack.
//!
//! ## Components
//!
//! __Selection__
//!
//! - __[`FeaturePack`]__: tri-state feature set with merging and ranking.
//! - __[`DescriptorTable`]__: run-time snapshot of a descriptor list.
//! - __[`select`]__: picks the highest ranked pair for a feature pack.
//!
//! __Allocation__
//!
//! - __[`Pack`]__: owns every resource of a descriptor list and hands out
//!   allocators by type, by resource, or by features.
//! - __[`AnyAlloc`]__: type-erased handle to a selected allocator.
//! - __[`Monotonic`]__, __[`SyncPool`]__, __[`UnsyncPool`]__: reference
//!   memory resources.
//!
//! __Construction__
//!
//! - __[`construct`]__: builds objects through their allocator convention.
//! - __[`CloneIn`]__: recursively re-homes values into another allocator.
//! - __[`Local`]__: an object bound to a scoped local resource.
//!
//! [`FeaturePack`]: feature::FeaturePack
//! [`DescriptorTable`]: descriptor::DescriptorTable
//! [`select`]: rank::select
//!
//! [`Pack`]: pack::Pack
//! [`AnyAlloc`]: resource::AnyAlloc
//! [`Monotonic`]: resource::Monotonic
//! [`SyncPool`]: resource::SyncPool
//! [`UnsyncPool`]: resource::UnsyncPool
//!
//! [`construct`]: construct::construct
//! [`CloneIn`]: construct::CloneIn
//! [`Local`]: local::Local

pub mod feature;
pub mod error;
pub mod descriptor;
pub mod rank;
pub mod resource;
pub mod standard;
pub mod pack;
pub mod construct;
pub mod local;
pub mod context;
