//! Anthropic Messages API client
//!
//! One HTTP attempt per call; retries and the outer timeout live in
//! [`super::RetryingClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ensure_success;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Role, StopReason, TokenUsage};
use crate::config::LlmConfig;

const API_VERSION: &str = "2023-06-01";

/// Wait applied to a 429 without a usable `retry-after`
const RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(60);

/// Client for Anthropic's `/v1/messages` endpoint
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Build from the `llm` config section; the API key comes from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "AnthropicClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn messages_request<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens.min(self.max_tokens),
            system: Some(request.system_prompt.as_str()).filter(|s| !s.is_empty()),
            messages: request
                .messages
                .iter()
                .map(|m| TurnPayload {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
        }
    }

    fn into_completion(reply: MessagesReply) -> CompletionResponse {
        let text = reply
            .content
            .into_iter()
            .filter_map(|block| match block {
                ReplyBlock::Text { text } => Some(text),
                ReplyBlock::Other => None,
            })
            .collect::<String>();

        CompletionResponse {
            content: Some(text).filter(|t| !t.is_empty()),
            stop_reason: reply
                .stop_reason
                .as_deref()
                .map(StopReason::from_anthropic)
                .unwrap_or(StopReason::EndTurn),
            usage: TokenUsage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "AnthropicClient::complete: called");
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.messages_request(&request))
            .send()
            .await?;

        let response = ensure_success(response, RATE_LIMIT_FALLBACK).await?;
        let reply: MessagesReply = response.json().await?;
        Ok(Self::into_completion(reply))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<TurnPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct TurnPayload<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ReplyBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: ReplyUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplyBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client() -> AnthropicClient {
        AnthropicClient {
            model: "claude-sonnet-4".to_string(),
            api_key: "test".to_string(),
            base_url: "https://example.invalid".to_string(),
            http: Client::new(),
            max_tokens: 1024,
        }
    }

    #[test]
    fn test_request_shape() {
        let client = client();
        let request = CompletionRequest::prompt("List attractions", 4096);
        let body = serde_json::to_value(client.messages_request(&request)).unwrap();

        assert_eq!(body["model"], "claude-sonnet-4");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "List attractions");
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_request_carries_system_and_history() {
        let client = client();
        let request = CompletionRequest {
            system_prompt: "Answer in JSON".to_string(),
            messages: vec![Message::user("Rome?"), Message::assistant("[]"), Message::user("Again")],
            max_tokens: 100,
        };
        let body = serde_json::to_value(client.messages_request(&request)).unwrap();

        assert_eq!(body["system"], "Answer in JSON");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_reply_keeps_only_text_blocks() {
        let raw = serde_json::json!({
            "content": [
                { "type": "text", "text": "Trastevere" },
                { "type": "thinking", "thinking": "..." }
            ],
            "stop_reason": "max_tokens",
            "usage": { "input_tokens": 5, "output_tokens": 2 }
        });
        let reply: MessagesReply = serde_json::from_value(raw).unwrap();
        let response = AnthropicClient::into_completion(reply);

        assert_eq!(response.content.as_deref(), Some("Trastevere"));
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.usage.output_tokens, 2);
    }

    #[test]
    fn test_empty_reply_has_no_content() {
        let reply: MessagesReply = serde_json::from_value(serde_json::json!({ "content": [] })).unwrap();
        let response = AnthropicClient::into_completion(reply);
        assert!(response.content.is_none());
        assert_eq!(response.stop_reason, StopReason::EndTurn);
    }
}
