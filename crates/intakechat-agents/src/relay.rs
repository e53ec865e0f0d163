use std::sync::Arc;
use std::time::Duration;

use intakechat_config::LlmConfig;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::providers::{ChatMessage, LlmProvider, LlmRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why the completion service produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("completion service timed out after {0}s")]
    Timeout(u64),

    #[error("completion service error: {0}")]
    Provider(String),

    #[error("completion service returned an empty answer")]
    EmptyResponse,
}

/// Forwards an assembled prompt to the completion service with a fixed
/// model and sampling settings. One attempt per call, bounded by a timeout.
#[derive(Clone)]
pub struct CompletionRelay {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    timeout: Duration,
}

impl CompletionRelay {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: None,
            temperature: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Check the completion service, bounded by the relay timeout. Errors
    /// and expiry both count as unhealthy.
    pub async fn health_check(&self) -> bool {
        match tokio::time::timeout(self.timeout, self.provider.health_check()).await {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(e)) => {
                warn!("health check failed: {e}");
                false
            }
            Err(_) => {
                warn!("health check timed out after {:?}", self.timeout);
                false
            }
        }
    }

    #[instrument(skip_all, fields(provider = self.provider.provider_id(), model = %self.model, messages = messages.len()))]
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, RelayError> {
        let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        debug!(prompt_chars, "relaying prompt");

        let request = LlmRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("completion failed: {e}");
                return Err(RelayError::Provider(e.to_string()));
            }
            Err(_) => {
                warn!("completion timed out after {:?}", self.timeout);
                return Err(RelayError::Timeout(self.timeout.as_secs()));
            }
        };

        if let Some(usage) = &response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "completion usage"
            );
        }

        match response.text.map(|t| t.trim().to_string()) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(RelayError::EmptyResponse),
        }
    }
}
