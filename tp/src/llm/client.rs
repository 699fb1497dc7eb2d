//! LlmClient trait definition

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless generative provider - each call is independent
///
/// Every reply is untrusted text; callers hand it to the response parsers and
/// never interpret it directly.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Send one prompt and return the raw reply text
    ///
    /// A reply without text content comes back as an empty string; the parsers
    /// treat that like any other malformed reply.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        debug!(prompt_len = prompt.len(), "generate: called");
        let response = self.complete(CompletionRequest::prompt(prompt, max_tokens)).await?;
        Ok(response.content.unwrap_or_default())
    }
}
