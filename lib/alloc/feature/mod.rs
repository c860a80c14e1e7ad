//! Declarative allocator characteristics and their compatibility score.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Number of opposite-paired feature axes.
pub const AXIS_COUNT: usize = 6;

/// Score of a candidate that contradicts a required axis of the request.
/// A disqualified pair is never selected.
pub const DISQUALIFIED: i32 = -100;

/// Score of a candidate before any optional axis is weighed.
pub const BASE_SCORE: i32 = 100;

/// One side of an opposite-paired allocator characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Stateful,
    Stateless,
    Sync,
    Unsync,
    NoopDealloc,
    NoNoopDealloc,
    HighContention,
    LowContention,
    HighUtilization,
    LowUtilization,
    HighLocality,
    LowLocality,
}

impl Feature {
    /// Every feature, positive side first within each axis.
    pub const ALL: [Feature; 2 * AXIS_COUNT] = [
        Feature::Stateful, Feature::Stateless,
        Feature::Sync, Feature::Unsync,
        Feature::NoopDealloc, Feature::NoNoopDealloc,
        Feature::HighContention, Feature::LowContention,
        Feature::HighUtilization, Feature::LowUtilization,
        Feature::HighLocality, Feature::LowLocality,
    ];

    /// Returns the axis this feature is one side of.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Feature::Stateful | Feature::Stateless => Axis::State,
            Feature::Sync | Feature::Unsync => Axis::Sync,
            Feature::NoopDealloc | Feature::NoNoopDealloc => Axis::NoopDealloc,
            Feature::HighContention | Feature::LowContention => Axis::Contention,
            Feature::HighUtilization | Feature::LowUtilization => Axis::Utilization,
            Feature::HighLocality | Feature::LowLocality => Axis::Locality,
        }
    }

    /// Returns `true` if this feature is the positive side of its axis.
    #[inline]
    pub const fn polarity(self) -> bool {
        matches!(self, Feature::Stateful | Feature::Sync | Feature::NoopDealloc
                     | Feature::HighContention | Feature::HighUtilization
                     | Feature::HighLocality)
    }

    /// Returns the other side of this feature's axis.
    #[inline]
    pub const fn opposite(self) -> Feature {
        self.axis().feature(!self.polarity())
    }

    /// Returns the snake_case name of this feature.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::Stateful => "stateful",
            Feature::Stateless => "stateless",
            Feature::Sync => "sync",
            Feature::Unsync => "unsync",
            Feature::NoopDealloc => "noop_dealloc",
            Feature::NoNoopDealloc => "no_noop_dealloc",
            Feature::HighContention => "high_contention",
            Feature::LowContention => "low_contention",
            Feature::HighUtilization => "high_utilization",
            Feature::LowUtilization => "low_utilization",
            Feature::HighLocality => "high_locality",
            Feature::LowLocality => "low_locality",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pair of opposite features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Stateful vs. stateless; required.
    State = 0,
    /// Sync vs. unsync; required.
    Sync = 1,
    NoopDealloc = 2,
    Contention = 3,
    Utilization = 4,
    Locality = 5,
}

impl Axis {
    pub const ALL: [Axis; AXIS_COUNT] = [
        Axis::State, Axis::Sync, Axis::NoopDealloc,
        Axis::Contention, Axis::Utilization, Axis::Locality,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` if a mismatch on this axis disqualifies a candidate.
    #[inline]
    pub const fn is_required(self) -> bool {
        matches!(self, Axis::State | Axis::Sync)
    }

    /// Returns the score weight of this axis; zero for required axes.
    #[inline]
    pub const fn weight(self) -> i32 {
        match self {
            Axis::State | Axis::Sync => 0,
            Axis::NoopDealloc => 50,
            Axis::Contention => 20,
            Axis::Utilization => 10,
            Axis::Locality => 30,
        }
    }

    /// Returns the feature on the `value` side of this axis.
    pub const fn feature(self, value: bool) -> Feature {
        match (self, value) {
            (Axis::State, true) => Feature::Stateful,
            (Axis::State, false) => Feature::Stateless,
            (Axis::Sync, true) => Feature::Sync,
            (Axis::Sync, false) => Feature::Unsync,
            (Axis::NoopDealloc, true) => Feature::NoopDealloc,
            (Axis::NoopDealloc, false) => Feature::NoNoopDealloc,
            (Axis::Contention, true) => Feature::HighContention,
            (Axis::Contention, false) => Feature::LowContention,
            (Axis::Utilization, true) => Feature::HighUtilization,
            (Axis::Utilization, false) => Feature::LowUtilization,
            (Axis::Locality, true) => Feature::HighLocality,
            (Axis::Locality, false) => Feature::LowLocality,
        }
    }
}

/// Immutable set of allocator characteristics, each axis either
/// unspecified, true, or false.
///
/// A pack describes both what a caller requests and what an allocator or
/// resource provides. `rank` scores a candidate pack against a requested one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Feature>", into = "Vec<Feature>")]
pub struct FeaturePack {
    axes: [Option<bool>; AXIS_COUNT],
}

impl FeaturePack {
    /// The pack with no axis specified.
    pub const EMPTY: FeaturePack = FeaturePack { axes: [None; AXIS_COUNT] };

    #[inline]
    pub const fn new() -> FeaturePack {
        FeaturePack::EMPTY
    }

    /// Returns a pack with each of `features` set, later features winning
    /// over earlier features on the same axis.
    pub const fn of(features: &[Feature]) -> FeaturePack {
        let mut pack = FeaturePack::EMPTY;
        let mut i = 0;
        while i < features.len() {
            pack = pack.with(features[i]);
            i += 1;
        }
        pack
    }

    /// Returns a copy of this pack with `feature` set and its opposite cleared.
    #[inline]
    pub const fn with(mut self, feature: Feature) -> FeaturePack {
        self.axes[feature.axis().index()] = Some(feature.polarity());
        self
    }

    /// Sets `feature` and clears its opposite.
    #[inline]
    pub fn set(&mut self, feature: Feature) {
        *self = self.with(feature);
    }

    /// Returns the value of `axis`, or `None` if unspecified.
    #[inline]
    pub const fn value(&self, axis: Axis) -> Option<bool> {
        self.axes[axis.index()]
    }

    /// Returns `true` if `feature` holds; unspecified axes hold neither side.
    #[inline]
    pub const fn is(&self, feature: Feature) -> bool {
        match self.value(feature.axis()) {
            Some(value) => value == feature.polarity(),
            None => false,
        }
    }

    /// Returns `true` if either side of `feature`'s axis is set.
    #[inline]
    pub const fn specified(&self, feature: Feature) -> bool {
        self.value(feature.axis()).is_some()
    }

    /// Returns `true` if no axis is specified.
    pub const fn is_empty(&self) -> bool {
        let mut i = 0;
        while i < AXIS_COUNT {
            if self.axes[i].is_some() {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Combines the features of a `parent` allocator with those of a `child`
    /// resource. A positive declaration from either side survives; a
    /// negative declaration survives only if neither side is positive.
    pub const fn merge(parent: FeaturePack, child: FeaturePack) -> FeaturePack {
        let mut merged = FeaturePack::EMPTY;
        let mut i = 0;
        while i < AXIS_COUNT {
            merged.axes[i] = match (parent.axes[i], child.axes[i]) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), _) | (_, Some(false)) => Some(false),
                (None, None) => None,
            };
            i += 1;
        }
        merged
    }

    /// Returns `true` if this candidate contradicts `requested` on a
    /// required axis.
    pub const fn disqualifies(&self, requested: &FeaturePack) -> bool {
        let mut i = 0;
        while i < AXIS_COUNT {
            let axis = Axis::ALL[i];
            if axis.is_required() {
                if let (Some(have), Some(want)) = (self.value(axis), requested.value(axis)) {
                    if have != want {
                        return true;
                    }
                }
            }
            i += 1;
        }
        false
    }

    /// Scores this candidate pack against a `requested` pack. Returns
    /// `DISQUALIFIED` on a required-axis mismatch.
    pub const fn rank(&self, requested: &FeaturePack) -> i32 {
        if self.disqualifies(requested) {
            return DISQUALIFIED;
        }
        let mut score = BASE_SCORE;
        let mut i = 0;
        while i < AXIS_COUNT {
            let axis = Axis::ALL[i];
            let weight = axis.weight();
            if !axis.is_required() {
                match (self.value(axis), requested.value(axis)) {
                    (Some(have), Some(want)) => {
                        if have == want {
                            score += weight;
                        } else {
                            score -= weight;
                        }
                    }
                    // Requester is indifferent; the candidate's stated
                    // direction always agrees with itself.
                    (Some(_), None) => score += weight / 2,
                    _ => {}
                }
            }
            i += 1;
        }
        score
    }

    /// Returns an iterator over the set features, in axis order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Axis::ALL.iter().filter_map(move |&axis| self.value(axis).map(|value| axis.feature(value)))
    }
}

impl From<Vec<Feature>> for FeaturePack {
    fn from(features: Vec<Feature>) -> FeaturePack {
        FeaturePack::of(&features)
    }
}

impl From<FeaturePack> for Vec<Feature> {
    fn from(pack: FeaturePack) -> Vec<Feature> {
        pack.features().collect()
    }
}

impl fmt::Display for FeaturePack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{")?;
        for (i, feature) in self.features().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            f.write_str(feature.name())?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for FeaturePack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FeaturePack{}", self)
    }
}

/// A feature pack named by a type, so it can select allocators statically.
pub trait Features {
    const PACK: FeaturePack;
}

/// Declares a unit type implementing `Features` for a constant pack.
#[macro_export]
macro_rules! features {
    ($(#[$attr:meta])* $vis:vis struct $name:ident = [$($feature:ident),* $(,)?];) => (
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default)]
        $vis struct $name;

        impl $crate::feature::Features for $name {
            const PACK: $crate::feature::FeaturePack = $crate::feature::FeaturePack::of(&[
                $($crate::feature::Feature::$feature),*
            ]);
        }
    );
}

features! {
    /// Safe default heap allocation: stateless and thread-safe.
    pub struct GeneralFeatures = [Stateless, Sync];
}

features! {
    /// Cheap bump allocation: stateful, single-threaded, free deallocation.
    pub struct LocalFeatures = [Stateful, NoopDealloc, Unsync];
}
