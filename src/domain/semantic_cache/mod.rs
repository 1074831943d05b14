//! Semantic cache domain models and traits
//!
//! Responses are keyed by query embedding: a lookup matches the closest live
//! entry within a cosine-distance threshold instead of requiring exact text.

mod config;
mod entry;
mod policy;
mod repository;

pub use config::SemanticCacheConfig;
pub use entry::{entry_id, CacheEntry};
pub use policy::{compare_for_eviction, compare_matches};
pub use repository::{CacheLookup, SemanticCache, SemanticCacheStats};
