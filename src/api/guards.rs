// Origin and payload guards
//
// Both run as middleware ahead of the handler and only inspect POSTs,
// so preflight and the 405 fallback keep their normal behavior.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ProxyError;
use super::AppState;

/// Reject requests whose Origin and Referer both fail the allow-list.
/// The upstream credential is shared per deployment, so unauthenticated
/// direct callers would be stealing its quota.
pub async fn origin_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let origin = header_str(&request, &header::ORIGIN);
    let referer = header_str(&request, &header::REFERER);
    let allowed = state.config.allowed_origins.iter().any(|prefix| {
        origin.starts_with(prefix.as_str()) || referer.starts_with(prefix.as_str())
    });

    if !allowed {
        tracing::warn!(
            "Rejected request from unlisted origin: origin={:?} referer={:?}",
            origin,
            referer
        );
        return ProxyError::Forbidden.into_response();
    }

    next.run(request).await
}

/// Reject oversized bodies by declared Content-Length before anything
/// reads or parses them. The declared value is trusted as-is.
pub async fn payload_guard(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let declared: u64 = header_str(&request, &header::CONTENT_LENGTH)
        .parse()
        .unwrap_or(0);

    if declared > state.config.max_body_bytes {
        tracing::warn!(
            "Rejected oversized payload: {} bytes declared, limit {}",
            declared,
            state.config.max_body_bytes
        );
        return ProxyError::PayloadTooLarge.into_response();
    }

    next.run(request).await
}

fn header_str<'a>(request: &'a Request<Body>, name: &HeaderName) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
