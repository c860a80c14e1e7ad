use thiserror::Error;
use crate::feature::FeaturePack;

/// Allocator pack configuration error.
///
/// Every variant names the type or feature pack that failed to resolve.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No allocator descriptor of the given type is configured.
    #[error("allocator descriptor `{name}` is not in the configured descriptor list")]
    MissingAllocatorDescriptor {
        name: &'static str,
    },
    /// No resource descriptor of the given type is configured.
    #[error("resource descriptor `{name}` is not in the configured resource list")]
    MissingResourceDescriptor {
        name: &'static str,
    },
    /// A resource storage is neither default-constructible nor supplied.
    #[error("resource storage `{name}` is not default-constructible and was not supplied")]
    ResourceNotStored {
        name: &'static str,
    },
    /// An allocator descriptor's default resource is not one of its resources.
    #[error("default resource `{resource}` of allocator descriptor `{allocator}` is not among its resources")]
    DefaultResourceMissing {
        allocator: &'static str,
        resource: &'static str,
    },
    /// A selection was ranked from another descriptor list than the pack's.
    #[error("selection {allocator}/{resource} was not made from descriptor list `{expected}`")]
    ForeignSelection {
        allocator: &'static str,
        resource: &'static str,
        expected: &'static str,
    },
    /// An allocator/resource position names no pair of the descriptor list.
    #[error("no allocator/resource pair at position ({allocator}, {resource})")]
    PairOutOfRange {
        allocator: usize,
        resource: usize,
    },
    /// Every allocator/resource pair contradicts the requested features.
    #[error("no allocator/resource pair satisfies {requested}")]
    NoMatch {
        requested: FeaturePack,
    },
}
