// Error taxonomy, rendered as the Gemini-style error envelope
//
// Every failure path leaves the proxy through this type: the caller
// sees `{"error": {"code", "message", "status"}}` and nothing else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ratelimit::store::StoreError;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("origin not allowed")]
    Forbidden,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("GROQ_API_KEY is not configured")]
    MissingApiKey,

    #[error("rate limit exceeded, try again later")]
    RateLimited,

    /// Upstream rejected the request; its status code is propagated
    /// verbatim.
    #[error("{message}")]
    Upstream { code: u16, message: String },

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            ProxyError::Forbidden => StatusCode::FORBIDDEN,
            ProxyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Upstream { code, .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Symbolic status token of the envelope. Only the rate-limit case
    /// is distinguished among upstream failures.
    pub fn symbolic_status(&self) -> &'static str {
        match self {
            ProxyError::Forbidden => "PERMISSION_DENIED",
            ProxyError::PayloadTooLarge => "INVALID_ARGUMENT",
            ProxyError::RateLimited => "RESOURCE_EXHAUSTED",
            ProxyError::Upstream { code: 429, .. } => "RESOURCE_EXHAUSTED",
            _ => "INTERNAL",
        }
    }
}

impl From<StoreError> for ProxyError {
    fn from(err: StoreError) -> Self {
        ProxyError::Internal(err.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "status": self.symbolic_status(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_429_maps_to_resource_exhausted() {
        let err = ProxyError::Upstream {
            code: 429,
            message: "Rate limit reached".to_string(),
        };
        assert_eq!(err.http_status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.symbolic_status(), "RESOURCE_EXHAUSTED");
    }

    #[test]
    fn other_upstream_codes_map_to_internal() {
        let err = ProxyError::Upstream {
            code: 400,
            message: "bad request".to_string(),
        };
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.symbolic_status(), "INTERNAL");
    }

    #[test]
    fn timeout_message_is_distinct_from_generic_internal() {
        let timeout = ProxyError::UpstreamTimeout.to_string();
        let generic = ProxyError::Internal("boom".to_string()).to_string();
        assert_ne!(timeout, generic);
        assert!(timeout.contains("timed out"));
    }

    #[test]
    fn guard_errors_use_the_documented_statuses() {
        assert_eq!(ProxyError::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ProxyError::Forbidden.symbolic_status(),
            "PERMISSION_DENIED"
        );
        assert_eq!(
            ProxyError::PayloadTooLarge.http_status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ProxyError::PayloadTooLarge.symbolic_status(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            ProxyError::MissingApiKey.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ProxyError::MissingApiKey.symbolic_status(), "INTERNAL");
    }
}
