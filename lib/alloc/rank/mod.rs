//! Selection of the allocator/resource pair that best fits a feature pack.

use core::any::TypeId;
use log::{debug, trace};
use crate::descriptor::{DescriptorTable, Pair};
use crate::error::ConfigError;
use crate::feature::{FeaturePack, DISQUALIFIED};

/// The winning allocator/resource pair for a requested feature pack.
///
/// A selection is tied to the descriptor list it was ranked from; a pack
/// rejects selections made against any other list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Name of the winning allocator descriptor.
    pub allocator: &'static str,
    /// Name of the winning resource descriptor.
    pub resource: &'static str,
    allocator_index: usize,
    resource_index: usize,
    list: TypeId,
    pub score: i32,
    /// Merged features of the winning pair.
    pub features: FeaturePack,
    /// `false` if the winning resource has stateless storage.
    pub has_resource: bool,
}

impl Selection {
    fn from_pair(table: &DescriptorTable, pair: &Pair<'_>, score: i32) -> Selection {
        Selection {
            allocator: pair.allocator.name,
            resource: pair.resource.name,
            allocator_index: pair.allocator_index,
            resource_index: pair.resource_index,
            list: table.list_id(),
            score,
            features: pair.features(),
            has_resource: pair.resource.has_resource(),
        }
    }

    /// Position of the winning allocator descriptor in its list.
    #[inline]
    pub fn allocator_index(&self) -> usize {
        self.allocator_index
    }

    /// Position of the winning resource descriptor in its allocator's list.
    #[inline]
    pub fn resource_index(&self) -> usize {
        self.resource_index
    }

    /// Type id of the descriptor list this selection was ranked from.
    #[inline]
    pub fn list_id(&self) -> TypeId {
        self.list
    }
}

/// Returns the highest scoring pair of `table` for `requested`.
///
/// Pairs are scored in declaration order, allocator descriptors first, and
/// a later pair must score strictly higher to replace the current best, so
/// ties go to the earliest declared pair. Disqualified pairs are never
/// selected; if every pair is disqualified, returns `ConfigError::NoMatch`.
pub fn select(table: &DescriptorTable, requested: &FeaturePack) -> Result<Selection, ConfigError> {
    let mut best: Option<Selection> = None;
    for pair in table.cross_product() {
        let score = pair.rank(requested);
        trace!("rank {}/{} {} against {}: {}",
               pair.allocator.name, pair.resource.name, pair.features(), requested, score);
        if score == DISQUALIFIED {
            continue;
        }
        match best {
            Some(ref current) if current.score >= score => {}
            _ => best = Some(Selection::from_pair(table, &pair, score)),
        }
    }
    match best {
        Some(selection) => {
            debug!("selected {}/{} for {} with score {}",
                   selection.allocator, selection.resource, requested, selection.score);
            Ok(selection)
        }
        None => Err(ConfigError::NoMatch { requested: *requested }),
    }
}

/// Ranker bound to one descriptor table.
#[derive(Clone, Copy, Debug)]
pub struct Ranker<'t> {
    table: &'t DescriptorTable,
}

impl<'t> Ranker<'t> {
    #[inline]
    pub fn new(table: &'t DescriptorTable) -> Ranker<'t> {
        Ranker { table }
    }

    /// Returns every pair with its score, in declaration order.
    pub fn scores(&self, requested: &FeaturePack) -> Vec<(Pair<'t>, i32)> {
        self.table.cross_product()
            .into_iter()
            .map(|pair| {
                let score = pair.rank(requested);
                (pair, score)
            })
            .collect()
    }

    #[inline]
    pub fn select(&self, requested: &FeaturePack) -> Result<Selection, ConfigError> {
        select(self.table, requested)
    }
}
