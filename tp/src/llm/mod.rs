//! Generative provider module for tripplanner
//!
//! Provides the provider trait, two HTTP clients, and the retry/timeout
//! wrapper every production client is built with.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod retry;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, RetryingClient};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create a provider client based on the provider specified in config
///
/// Supports "gemini" and "anthropic". The returned client already applies the
/// configured timeout and retry policy.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    let inner: Arc<dyn LlmClient> = match config.provider.as_str() {
        "gemini" => Arc::new(GeminiClient::from_config(config)?),
        "anthropic" => Arc::new(AnthropicClient::from_config(config)?),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            return Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: gemini, anthropic",
                other
            )));
        }
    };

    Ok(Arc::new(RetryingClient::new(inner, RetryPolicy::from_config(config))))
}
