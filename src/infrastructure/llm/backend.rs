use async_trait::async_trait;

use super::http_client::HttpClient;
use super::{AnthropicProvider, AzureOpenAiProvider, EchoProvider, OpenAiProvider};
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Closed set of language model backends selected at configuration time
#[derive(Debug)]
pub enum LlmBackend {
    OpenAi(OpenAiProvider<HttpClient>),
    Anthropic(AnthropicProvider<HttpClient>),
    AzureOpenAi(AzureOpenAiProvider<HttpClient>),
    Echo(EchoProvider),
}

#[async_trait]
impl LlmProvider for LlmBackend {
    async fn generate(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        match self {
            Self::OpenAi(provider) => provider.generate(model, request).await,
            Self::Anthropic(provider) => provider.generate(model, request).await,
            Self::AzureOpenAi(provider) => provider.generate(model, request).await,
            Self::Echo(provider) => provider.generate(model, request).await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi(provider) => provider.provider_name(),
            Self::Anthropic(provider) => provider.provider_name(),
            Self::AzureOpenAi(provider) => provider.provider_name(),
            Self::Echo(provider) => provider.provider_name(),
        }
    }
}
