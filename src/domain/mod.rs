//! Domain layer - Core types, traits and algorithms

pub mod embedding;
pub mod error;
pub mod llm;
pub mod retrieval;
pub mod routing;
pub mod semantic_cache;
pub mod usage;

pub use error::DomainError;
