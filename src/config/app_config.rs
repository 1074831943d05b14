use serde::Deserialize;

use crate::domain::retrieval::RetrievalConfig;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::domain::usage::UsageConfig;
use crate::domain::DomainError;
use crate::infrastructure::embedding::EmbeddingConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::routing::RouterConfig;
use crate::infrastructure::services::PipelineConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub cache: SemanticCacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// `config/default.*`, then `config/local.*`, then `APP__` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Cross-section checks that serde defaults cannot express
    pub fn validate(&self) -> Result<(), DomainError> {
        let dimensions = self.embedding.dimensions;

        if self.cache.dimensions != dimensions {
            return Err(DomainError::configuration(format!(
                "cache.dimensions ({}) must match embedding.dimensions ({})",
                self.cache.dimensions, dimensions
            )));
        }

        if self.retrieval.dimensions != dimensions {
            return Err(DomainError::configuration(format!(
                "retrieval.dimensions ({}) must match embedding.dimensions ({})",
                self.retrieval.dimensions, dimensions
            )));
        }

        if !(0.0..1.0).contains(&self.cache.distance_threshold) {
            return Err(DomainError::configuration(
                "cache.distance_threshold must be within [0, 1)",
            ));
        }

        self.retrieval
            .validate()
            .map_err(|e| DomainError::configuration(e.to_string()))
    }
}
