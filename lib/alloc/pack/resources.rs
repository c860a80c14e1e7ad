use core::any::{type_name, Any, TypeId};
use core::fmt;
use log::debug;
use crate::descriptor::{Storage, STATELESS, is_stateless};
use crate::pack::PackConfig;

/// One stored resource.
struct Entry {
    type_id: TypeId,
    name: &'static str,
    storage: Box<dyn Any>,
}

/// Heterogeneous set holding at most one instance per storage type.
///
/// `Stateless` storage is never stored; lookups of it resolve to a shared
/// static instance.
#[derive(Default)]
pub struct ResourceSet {
    entries: Vec<Entry>,
}

impl ResourceSet {
    #[inline]
    pub fn new() -> ResourceSet {
        ResourceSet { entries: Vec::new() }
    }

    /// Stores `storage`, returning the instance it replaces, if any.
    pub fn insert<S: Storage>(&mut self, storage: S) -> Option<S> {
        if is_stateless::<S>() {
            return None;
        }
        let type_id = TypeId::of::<S>();
        match self.entries.iter_mut().find(|entry| entry.type_id == type_id) {
            Some(entry) => {
                let old = core::mem::replace(&mut entry.storage, Box::new(storage));
                old.downcast::<S>().ok().map(|old| *old)
            }
            None => {
                self.entries.push(Entry {
                    type_id,
                    name: type_name::<S>(),
                    storage: Box::new(storage),
                });
                None
            }
        }
    }

    /// Returns the stored instance of `S`.
    pub fn get<S: Storage>(&self) -> Option<&S> {
        if is_stateless::<S>() {
            return (&STATELESS as &dyn Any).downcast_ref::<S>();
        }
        let type_id = TypeId::of::<S>();
        self.entries.iter()
            .find(|entry| entry.type_id == type_id)
            .and_then(|entry| entry.storage.downcast_ref::<S>())
    }

    #[inline]
    pub fn contains<S: Storage>(&self) -> bool {
        self.get::<S>().is_some()
    }

    /// Returns `true` if storage of type `type_id` is stored.
    #[inline]
    pub fn contains_id(&self, type_id: TypeId) -> bool {
        self.entries.iter().any(|entry| entry.type_id == type_id)
    }

    /// Returns the type and name of every stored instance, in insertion order.
    pub fn storages(&self) -> impl Iterator<Item = (TypeId, &'static str)> + '_ {
        self.entries.iter().map(|entry| (entry.type_id, entry.name))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores a default instance of `S`, unless one is already stored, or
    /// `S` has no default.
    pub(crate) fn wire_default<S: Storage>(&mut self, config: &PackConfig) {
        if is_stateless::<S>() || self.contains_id(TypeId::of::<S>()) {
            return;
        }
        if let Some(storage) = S::try_default(config) {
            debug!("default-constructed resource storage {}", type_name::<S>());
            self.entries.push(Entry {
                type_id: TypeId::of::<S>(),
                name: type_name::<S>(),
                storage: Box::new(storage),
            });
        }
    }
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.name))
            .finish()
    }
}
