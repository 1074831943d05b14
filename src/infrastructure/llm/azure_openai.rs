use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use super::openai::{build_chat_body, parse_chat_response};
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse};
use crate::domain::DomainError;

fn default_api_version() -> String {
    "2024-02-01".to_string()
}

/// Azure OpenAI resource settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl AzureOpenAiConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: default_api_version(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// Azure OpenAI provider; the model name is the deployment name
#[derive(Debug)]
pub struct AzureOpenAiProvider<C: HttpClientTrait> {
    client: C,
    config: AzureOpenAiConfig,
}

impl<C: HttpClientTrait> AzureOpenAiProvider<C> {
    pub fn new(client: C, config: AzureOpenAiConfig) -> Self {
        Self { client, config }
    }

    fn build_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            deployment,
            self.config.api_version
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("api-key", self.config.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for AzureOpenAiProvider<C> {
    async fn generate(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let body = build_chat_body(None, &request);
        let response = self
            .client
            .post_json(&self.build_url(model), self.headers(), &body)
            .await?;

        parse_chat_response(self.provider_name(), response)
    }

    fn provider_name(&self) -> &'static str {
        "azure_openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str =
        "https://verishield.openai.azure.com/openai/deployments/gpt4o-prod/chat/completions?api-version=2024-02-01";

    #[tokio::test]
    async fn test_azure_generate_uses_deployment_url() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            serde_json::json!({
                "id": "az-1",
                "model": "gpt-4o",
                "choices": [{ "message": { "role": "assistant", "content": "From Azure" } }],
                "usage": { "prompt_tokens": 4, "completion_tokens": 2 }
            }),
        );
        let config = AzureOpenAiConfig::new("https://verishield.openai.azure.com/", "az-key");
        let provider = AzureOpenAiProvider::new(client, config);

        let response = provider
            .generate("gpt4o-prod", LlmRequest::builder().user("Hi").build())
            .await
            .unwrap();

        assert_eq!(response.content, "From Azure");
        assert_eq!(response.usage.total_tokens, 6);

        let (_, body) = &provider.client.requests()[0];
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_api_version_override() {
        let config = AzureOpenAiConfig::new("https://x", "k").with_api_version("2024-06-01");
        let provider = AzureOpenAiProvider::new(MockHttpClient::new(), config);

        assert!(provider.build_url("d").ends_with("api-version=2024-06-01"));
    }
}
