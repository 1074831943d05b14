//! Infrastructure layer - Provider adapters, stores and services

pub mod embedding;
pub mod llm;
pub mod observability;
pub mod retrieval;
pub mod routing;
pub mod semantic_cache;
pub mod services;
pub mod usage;
