use async_trait::async_trait;

use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponse, Usage};
use crate::domain::DomainError;

/// Offline provider that answers with the prompt it was given
///
/// Token counts use the same four-characters-per-token estimate as the
/// router so local runs exercise budgets and usage tracking.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn generate(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let prompt = request.prompt_text();
        if prompt.trim().is_empty() {
            return Err(DomainError::validation("Echo provider needs a user message"));
        }

        let content = format!("[{}] {}", model, prompt);
        let completion_tokens = content.chars().count().div_ceil(4) as u32;
        let id = format!("echo-{}", uuid::Uuid::new_v4());

        Ok(LlmResponse::new(id, model, content)
            .with_usage(Usage::new(request.estimated_prompt_tokens(), completion_tokens)))
    }

    fn provider_name(&self) -> &'static str {
        "echo"
    }
}
