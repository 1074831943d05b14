use thiserror::Error;

/// Core domain errors
///
/// `Clone` so that every caller coalesced behind a single in-flight
/// computation observes the same failure.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Provider timeout: {provider} did not answer within {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("All providers exhausted (attempted: {})", attempted.join(", "))]
    AllProvidersExhausted { attempted: Vec<String> },

    #[error("Budget exceeded: {message}")]
    BudgetExceeded { message: String },

    #[error("Cache degraded: {message}")]
    CacheDegraded { message: String },

    #[error("Index degraded: {message}")]
    IndexDegraded { message: String },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn provider_timeout(provider: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
            timeout_ms,
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn all_providers_exhausted(attempted: Vec<String>) -> Self {
        Self::AllProvidersExhausted { attempted }
    }

    pub fn budget_exceeded(message: impl Into<String>) -> Self {
        Self::BudgetExceeded {
            message: message.into(),
        }
    }

    pub fn cache_degraded(message: impl Into<String>) -> Self {
        Self::CacheDegraded {
            message: message.into(),
        }
    }

    pub fn index_degraded(message: impl Into<String>) -> Self {
        Self::IndexDegraded {
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Failures that count against a model's circuit breaker and trigger fallback
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::ProviderTimeout { .. })
    }

    /// Failures the pipeline must surface to the caller instead of degrading
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AllProvidersExhausted { .. } | Self::BudgetExceeded { .. } | Self::Cancelled { .. }
        )
    }
}
