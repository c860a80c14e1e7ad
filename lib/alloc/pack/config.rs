use serde::{Deserialize, Serialize};
use crate::resource::{PoolOptions, DEFAULT_CHUNK_SIZE};

/// Run-time configuration of the default-constructed storages of a pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Size of the first upstream chunk of a default `Monotonic` resource.
    pub monotonic_chunk_size: usize,
    /// Options of default pooled resources.
    pub pool: PoolOptions,
}

impl Default for PackConfig {
    fn default() -> PackConfig {
        PackConfig {
            monotonic_chunk_size: DEFAULT_CHUNK_SIZE,
            pool: PoolOptions::default(),
        }
    }
}
