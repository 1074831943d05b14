//! LLM provider implementations

mod anthropic;
mod azure_openai;
mod backend;
mod echo;
mod factory;
mod http_client;
mod openai;

pub use anthropic::AnthropicProvider;
pub use azure_openai::{AzureOpenAiConfig, AzureOpenAiProvider};
pub use backend::LlmBackend;
pub use echo::EchoProvider;
pub use factory::{LlmProviderConfig, LlmProviderFactory, LlmProviderKind};
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
