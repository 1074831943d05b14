use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::http_client::HttpClient;
use super::{
    AnthropicProvider, AzureOpenAiConfig, AzureOpenAiProvider, EchoProvider, LlmBackend,
    OpenAiProvider,
};
use crate::domain::DomainError;

fn default_api_version() -> String {
    "2024-02-01".to_string()
}

/// A named provider backend models can be routed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: LlmProviderKind,
}

impl LlmProviderConfig {
    pub fn new(name: impl Into<String>, kind: LlmProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Provider type and its connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmProviderKind {
    #[serde(alias = "openai")]
    OpenAi {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Anthropic {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    #[serde(alias = "azure_openai")]
    AzureOpenAi {
        endpoint: String,
        #[serde(default)]
        api_key: String,
        #[serde(default = "default_api_version")]
        api_version: String,
    },
    Echo,
}

/// Builds provider backends from configuration
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a backend whose HTTP requests give up after `timeout`
    pub fn create(config: &LlmProviderConfig, timeout: Duration) -> Result<LlmBackend, DomainError> {
        match &config.kind {
            LlmProviderKind::OpenAi { api_key, base_url } => {
                let api_key = Self::require_key(&config.name, api_key)?;
                let client = HttpClient::with_timeout(timeout)?;
                let provider = match base_url {
                    Some(base_url) => OpenAiProvider::with_base_url(client, api_key, base_url),
                    None => OpenAiProvider::new(client, api_key),
                };
                Ok(LlmBackend::OpenAi(provider))
            }

            LlmProviderKind::Anthropic { api_key, base_url } => {
                let api_key = Self::require_key(&config.name, api_key)?;
                let client = HttpClient::with_timeout(timeout)?;
                let provider = match base_url {
                    Some(base_url) => AnthropicProvider::with_base_url(client, api_key, base_url),
                    None => AnthropicProvider::new(client, api_key),
                };
                Ok(LlmBackend::Anthropic(provider))
            }

            LlmProviderKind::AzureOpenAi {
                endpoint,
                api_key,
                api_version,
            } => {
                let api_key = Self::require_key(&config.name, api_key)?;
                let azure_config =
                    AzureOpenAiConfig::new(endpoint, api_key).with_api_version(api_version);
                let provider =
                    AzureOpenAiProvider::new(HttpClient::with_timeout(timeout)?, azure_config);
                Ok(LlmBackend::AzureOpenAi(provider))
            }

            LlmProviderKind::Echo => Ok(LlmBackend::Echo(EchoProvider::new())),
        }
    }

    fn require_key<'a>(name: &str, api_key: &'a str) -> Result<&'a str, DomainError> {
        if api_key.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Provider '{}' is missing an api_key",
                name
            )));
        }
        Ok(api_key)
    }
}
