// src/services/transport.rs
use async_trait::async_trait;
use reqwest::Client;

use crate::message::{ChatRequest, ChatResponse};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("proxy returned status {0}")]
    Status(u16),

    #[error("request to proxy failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One round trip from the widget to the chat proxy.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        let response = self.client.post(&self.url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    #[tokio::test]
    async fn posts_message_and_history_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({
                "message": "what does he do?",
                "history": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "marketing"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(format!("{}/chat", server.uri()));
        let request = ChatRequest {
            message: "what does he do?".to_string(),
            history: vec![Message::user("hi"), Message::assistant("hello")],
        };
        let response = transport.send(&request).await.unwrap();
        assert_eq!(response.reply.as_deref(), Some("marketing"));
    }

    #[tokio::test]
    async fn missing_reply_field_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri());
        let request = ChatRequest { message: "hi".to_string(), history: vec![] };
        assert!(transport.send(&request).await.unwrap().reply.is_none());
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({"error": "AI service unavailable"})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(server.uri());
        let request = ChatRequest { message: "hi".to_string(), history: vec![] };
        assert!(matches!(transport.send(&request).await, Err(TransportError::Status(502))));
    }
}
