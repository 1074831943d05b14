//! Semantic cache implementations

mod in_memory;
mod single_flight;
mod sweeper;

pub use in_memory::InMemorySemanticCache;
pub use single_flight::SingleFlight;
pub use sweeper::spawn_cache_sweeper;
