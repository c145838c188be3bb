//! Generative model gateway

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::timeout::bounded;
use crate::domain::{DomainError, LlmProvider, LlmRequest};

#[derive(Debug, Clone)]
pub struct CompletionGateway {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Completion text for `request`; an empty completion counts as a failure
    pub async fn complete(&self, model: &str, request: LlmRequest) -> Result<String, DomainError> {
        let response = bounded("generation", self.timeout, self.provider.chat(model, request))
            .await
            .map_err(|e| match e {
                DomainError::Provider { .. } => DomainError::generation(e.detail()),
                other => other,
            })?;

        debug!(
            provider = self.provider.provider_name(),
            model = %model,
            finish_reason = ?response.finish_reason,
            "Completion received"
        );

        let content = response.into_content();
        if content.trim().is_empty() {
            return Err(DomainError::generation(format!("{} returned an empty completion", model)));
        }

        Ok(content)
    }
}
