// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::message::ErrorBody;
use crate::services::upstream::UpstreamError;

/// Errors the proxy handler can answer with. The `Display` text of
/// `Upstream` and `Internal` carries diagnostics for the log only; callers
/// see a generic body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `{ "error": ... }` body.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::MethodNotAllowed => "Method not allowed".to_string(),
            AppError::Upstream(_) => "AI service unavailable".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { .. } => AppError::Upstream(err.to_string()),
            UpstreamError::Transport(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upstream(detail) => tracing::error!(%detail, "upstream provider failed"),
            AppError::Internal(detail) => tracing::error!(%detail, "proxy error"),
            AppError::BadRequest(_) | AppError::MethodNotAllowed => {
                tracing::debug!(error = %self, "rejected request")
            }
        }

        let body = ErrorBody { error: self.public_message() };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_detail_stays_out_of_the_public_message() {
        let err = AppError::from(UpstreamError::Status {
            status: 529,
            body: r#"{"type":"overloaded_error"}"#.to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "AI service unavailable");
        assert!(err.to_string().contains("overloaded_error"));
    }

    #[test]
    fn status_codes_follow_the_wire_contract() {
        assert_eq!(AppError::BadRequest("Invalid JSON".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(AppError::Internal("boom".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Internal("boom".into()).public_message(), "Internal server error");
    }
}
