//! Model routing infrastructure

mod circuit_breaker;
mod config;
mod router;

pub use circuit_breaker::{CircuitBreaker, CircuitState, FailureOutcome};
pub use config::RouterConfig;
pub use router::{ModelRouter, ModelStatus, RoutedResponse};
