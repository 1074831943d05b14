use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{HashingEmbeddingProvider, HttpClient, OpenAiEmbeddingProvider, DEFAULT_EMBEDDING_MODEL};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Embedding backend selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    #[serde(alias = "openai")]
    OpenAi {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_model")]
        model: String,
    },
    #[default]
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            dimensions: default_dimensions(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EmbeddingConfig {
    pub fn with_provider(mut self, provider: EmbeddingProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Closed set of embedding providers selected at configuration time
#[derive(Debug)]
pub enum EmbeddingBackend {
    OpenAi(OpenAiEmbeddingProvider<HttpClient>),
    Hashing(HashingEmbeddingProvider),
}

impl EmbeddingBackend {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        match &config.provider {
            EmbeddingProviderKind::OpenAi {
                api_key,
                base_url,
                model,
            } => {
                if api_key.trim().is_empty() {
                    return Err(DomainError::configuration(
                        "OpenAI embedding provider requires an api_key",
                    ));
                }

                let client = HttpClient::with_timeout(config.timeout())?;
                let provider = OpenAiEmbeddingProvider::new(client, api_key, model, config.dimensions);
                Ok(Self::OpenAi(match base_url {
                    Some(base_url) => provider.with_base_url(base_url),
                    None => provider,
                }))
            }
            EmbeddingProviderKind::Hashing => {
                Ok(Self::Hashing(HashingEmbeddingProvider::new(config.dimensions)?))
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        match self {
            Self::OpenAi(provider) => provider.embed(text).await,
            Self::Hashing(provider) => provider.embed(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        match self {
            Self::OpenAi(provider) => provider.embed_batch(texts).await,
            Self::Hashing(provider) => provider.embed_batch(texts).await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi(provider) => provider.provider_name(),
            Self::Hashing(provider) => provider.provider_name(),
        }
    }

    fn dimensions(&self) -> usize {
        match self {
            Self::OpenAi(provider) => provider.dimensions(),
            Self::Hashing(provider) => provider.dimensions(),
        }
    }
}
