use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{
    error::AppError,
    message::{ChatResponse, Message},
    services::{history::sanitize_history, upstream::CompletionRequest},
    state::SharedState,
};

/// Single entry point of the proxy; every method lands here so that
/// preflight and method errors share the same contract as chat posts.
pub async fn proxy_handler(
    State(state): State<SharedState>,
    method: Method,
    body: Bytes,
) -> Result<Response, AppError> {
    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| AppError::BadRequest("Invalid JSON".to_string()))?;

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing message".to_string()))?;

    let mut messages = sanitize_history(payload.get("history"));
    let context_len = messages.len();
    messages.push(Message::user(message));

    let request = CompletionRequest {
        model: state.model.clone(),
        max_tokens: state.max_tokens,
        system: state.policy.text.clone(),
        messages,
    };

    tracing::debug!(context_len, model = %request.model, "forwarding chat message");

    let reply = state
        .provider
        .complete(&request)
        .await?
        .unwrap_or_else(|| state.contact.upstream_fallback());

    Ok(Json(ChatResponse { reply: Some(reply) }).into_response())
}

fn preflight_response() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type")),
        ],
    )
        .into_response()
}
