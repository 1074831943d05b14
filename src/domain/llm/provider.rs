use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for LLM providers (OpenAI, Anthropic, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Run a completion against `model` and report token usage
    async fn generate(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::Usage;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted provider: fixed answer, optional global or per-model failure
    /// and an optional artificial latency.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        content: String,
        usage: Usage,
        error: Option<String>,
        failing_models: HashSet<String>,
        delay: Option<Duration>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                content: "mock response".to_string(),
                usage: Usage::new(100, 50),
                error: None,
                failing_models: HashSet::new(),
                delay: None,
                calls: Mutex::new(HashMap::new()),
            }
        }

        pub fn with_response(mut self, content: impl Into<String>) -> Self {
            self.content = content.into();
            self
        }

        pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
            self.usage = Usage::new(prompt_tokens, completion_tokens);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn with_failing_model(mut self, model: impl Into<String>) -> Self {
            self.failing_models.insert(model.into());
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }

        pub fn calls_for(&self, model: &str) -> usize {
            self.calls.lock().unwrap().get(model).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            model: &str,
            _request: LlmRequest,
        ) -> Result<LlmResponse, DomainError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(model.to_string())
                .or_default() += 1;

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            if self.failing_models.contains(model) {
                return Err(DomainError::provider(self.name, format!("{} unavailable", model)));
            }

            Ok(LlmResponse::new(format!("mock-{}", self.calls()), model, &self.content)
                .with_usage(self.usage))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
