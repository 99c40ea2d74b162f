// src/services/upstream.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::message::Message;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_MAX_TOKENS: u32 = 350;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Body sent to the provider's messages endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
}

/// Something that turns a conversation into reply text.
///
/// `Ok(None)` means the provider answered but carried no text segment.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, UpstreamError>;
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    url: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("url", &self.url)
            .finish()
    }
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let body: Value = response.json().await?;
        Ok(first_text(&body).map(str::to_string))
    }
}

/// `content[0].text`, tolerating any shape that lacks it.
fn first_text(body: &Value) -> Option<&str> {
    body.get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: "be brief".to_string(),
            messages: vec![Message::user("hi")],
        }
    }

    #[tokio::test]
    async fn sends_credentials_and_returns_first_text_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "max_tokens": 350,
                "system": "be brief",
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "hello there"}, {"type": "text", "text": "ignored"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new("test-key", format!("{}/v1/messages", server.uri()));
        let reply = client.complete(&request()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("hello there"));
    }

    #[tokio::test]
    async fn empty_content_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("k", server.uri());
        assert_eq!(client.complete(&request()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_success_bodies_yield_none() {
        let bodies = [
            json!({ "content": null }),
            json!({ "content": [null] }),
            json!({ "content": [{ "type": "text", "text": 42 }] }),
            json!({ "content": "plain string" }),
            json!({}),
        ];
        for body in bodies {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                .mount(&server)
                .await;

            let client = AnthropicClient::new("k", server.uri());
            let reply = client.complete(&request()).await;
            assert!(matches!(reply, Ok(None)), "body {body}: {reply:?}");
        }
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("k", server.uri());
        assert!(matches!(client.complete(&request()).await, Err(UpstreamError::Transport(_))));
    }

    #[tokio::test]
    async fn non_ok_status_keeps_the_body_for_diagnostics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("bad", server.uri());
        match client.complete(&request()).await {
            Err(UpstreamError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid x-api-key");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let client = AnthropicClient::new("sk-secret", DEFAULT_UPSTREAM_URL);
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
