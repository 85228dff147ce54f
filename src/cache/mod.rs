//! Generic caching layer for remote data.
//!
//! This module provides a source-agnostic caching mechanism that:
//! - Caches whole query results and individual entities in separate slots
//! - Serves fresh entries without touching the network
//! - Serves stale entries when the network fetch fails
//! - Shares one fetch between concurrent identical requests

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, CACHE_TTL_SECS};
pub use storage::{CacheStorage, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, QueryKey};
