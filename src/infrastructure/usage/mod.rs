//! Usage tracking infrastructure

mod in_memory;

pub use in_memory::InMemoryUsageTracker;
